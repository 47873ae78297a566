//! Vendor detection and `(vendor, kind)` → provider lookup.

use tracing::{debug, info};

use super::{ExternalProvider, NvidiaProvider, RocmProvider, TempSensor, Vendor};
use crate::collector::traits::CommandRunner;
use crate::error::Error;
use crate::metric::{MetricKind, Readings};

/// Exhaustive `[vendor][kind]` provider table.
type ProviderTable = [[Box<dyn ExternalProvider>; 4]; 2];

/// Picks one GPU vendor toolchain and hands out its providers.
///
/// Both the detected vendor and the provider table are filled on first use
/// and kept for the registry's lifetime, so a registry probes at most once.
pub struct ProviderRegistry<R: CommandRunner> {
    runner: R,
    vendor: Option<Vendor>,
    table: Option<ProviderTable>,
    sensor: TempSensor,
    probes: usize,
}

impl<R: CommandRunner> ProviderRegistry<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            vendor: None,
            table: None,
            sensor: TempSensor::default(),
            probes: 0,
        }
    }

    /// Uses `vendor` without probing for it.
    pub fn with_vendor(mut self, vendor: Vendor) -> Self {
        self.vendor = Some(vendor);
        self
    }

    /// Sets the ROCm temperature sensor.
    ///
    /// If the table already exists (e.g. after [`Self::with_provider`]), its
    /// ROCm temperature entry is replaced by a default provider for `sensor`.
    pub fn with_temp_sensor(mut self, sensor: TempSensor) -> Self {
        self.sensor = sensor;
        if let Some(table) = &mut self.table {
            table[Vendor::Rocm.index()][MetricKind::Temp.index()] =
                Box::new(RocmProvider::new(MetricKind::Temp).with_sensor(sensor));
        }
        self
    }

    /// Replaces the provider registered for `(vendor, provider.kind())`.
    pub fn with_provider(mut self, vendor: Vendor, provider: Box<dyn ExternalProvider>) -> Self {
        let kind = provider.kind();
        self.table_mut()[vendor.index()][kind.index()] = provider;
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn runner_mut(&mut self) -> &mut R {
        &mut self.runner
    }

    /// Number of vendor probes issued so far.
    pub fn probe_count(&self) -> usize {
        self.probes
    }

    /// Returns the first vendor whose tool is present, probing only once.
    pub fn detect_vendor(&mut self) -> Result<Vendor, Error> {
        if let Some(vendor) = self.vendor {
            return Ok(vendor);
        }

        for vendor in Vendor::ALL {
            self.probes += 1;
            if self.runner.probe(vendor.program())? {
                info!("GPU vendor: {} ({})", vendor, vendor.program());
                self.vendor = Some(vendor);
                return Ok(vendor);
            }
            debug!("{} not found", vendor.program());
        }
        Err(Error::NoVendorFound)
    }

    /// Looks up the provider for `(vendor, kind)`.
    pub fn get(&mut self, vendor: Vendor, kind: MetricKind) -> &dyn ExternalProvider {
        self.table_mut()[vendor.index()][kind.index()].as_ref()
    }

    /// Collects `kind` from the detected vendor's tool.
    pub fn telemetry(&mut self, kind: MetricKind) -> Result<Readings, Error> {
        let vendor = self.detect_vendor()?;
        let sensor = self.sensor;
        let table = self.table.get_or_insert_with(|| build_table(sensor));
        let provider = &table[vendor.index()][kind.index()];
        let record = provider.collect(&self.runner)?;
        debug_assert_eq!(record.kind(), kind);
        Ok(record.into_readings())
    }

    fn table_mut(&mut self) -> &mut ProviderTable {
        let sensor = self.sensor;
        self.table.get_or_insert_with(|| build_table(sensor))
    }
}

fn build_table(sensor: TempSensor) -> ProviderTable {
    let nvidia = MetricKind::ALL
        .map(|kind| Box::new(NvidiaProvider::new(kind)) as Box<dyn ExternalProvider>);
    let rocm = MetricKind::ALL.map(|kind| {
        Box::new(RocmProvider::new(kind).with_sensor(sensor)) as Box<dyn ExternalProvider>
    });
    [nvidia, rocm]
}
