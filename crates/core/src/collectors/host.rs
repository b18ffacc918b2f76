use super::Collector;
use crate::{
    error::{CoreError, Result},
    model::MetricFamily,
};
use std::{path::PathBuf, process::Command};
use sysinfo::Components;
use tracing::{debug, warn};

/// One reading from the host's hardware sensor enumeration.
#[derive(Debug, Clone)]
pub struct SensorReading {
    pub chip: String,
    pub chip_type: String,
    pub sensor: String,
    pub value: f64,
}

/// Hardware sensor enumeration seam. The production source walks the
/// host's detected sensor components; tests inject failing sources to
/// exercise the probe's degraded path.
pub trait SensorSource {
    /// Append readings to `out` until done or until enumeration fails.
    /// Readings appended before a failure are kept and exported.
    fn readings(&self, out: &mut Vec<SensorReading>) -> Result<()>;
}

/// Sensor source backed by the host's component list.
pub struct SysinfoSensors;

impl SensorSource for SysinfoSensors {
    fn readings(&self, out: &mut Vec<SensorReading>) -> Result<()> {
        let components = Components::new_with_refreshed_list();

        for component in &components {
            let chip = component.label().to_string();
            let mut push = |sensor: &str, value: f64| {
                out.push(SensorReading {
                    chip: chip.clone(),
                    chip_type: "temperature".to_string(),
                    sensor: sensor.to_string(),
                    value,
                });
            };

            let temp = component.temperature();
            if temp > 0.0 {
                push("input", f64::from(temp));
            }
            let max = component.max();
            if max > 0.0 {
                push("max", f64::from(max));
            }
            if let Some(critical) = component.critical() {
                push("critical", f64::from(critical));
            }
        }

        Ok(())
    }
}

/// Collects host hardware sensor readings.
///
/// ```text
/// # HELP pve_host_sensors Sensors in each chip
/// # TYPE pve_host_sensors gauge
/// pve_host_sensors{chip="coretemp Core 0",chip_type="temperature",sensor="input"} 36
/// ```
///
/// Sensor availability is host-dependent, so enumeration failure is
/// logged and the family keeps whatever was read before the failure.
pub struct SensorsCollector {
    source: Box<dyn SensorSource>,
}

impl SensorsCollector {
    pub fn new() -> Self {
        Self::with_source(Box::new(SysinfoSensors))
    }

    pub fn with_source(source: Box<dyn SensorSource>) -> Self {
        Self { source }
    }
}

impl Default for SensorsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for SensorsCollector {
    fn name(&self) -> &'static str {
        "sensors"
    }

    fn collect(&self) -> Result<Vec<MetricFamily>> {
        let mut family = MetricFamily::gauge(
            "pve_host_sensors".to_string(),
            "Sensors in each chip".to_string(),
            ["chip", "chip_type", "sensor"].map(String::from).to_vec(),
        );

        let mut readings = Vec::new();
        if let Err(e) = self.source.readings(&mut readings) {
            warn!(error = %e, "sensor enumeration failed, exporting partial readings");
        }

        for reading in readings {
            family.sample(
                vec![reading.chip, reading.chip_type, reading.sensor],
                reading.value,
            );
        }

        Ok(vec![family])
    }
}

/// CPU frequency fields parsed out of `lscpu` output.
#[derive(Debug, Clone, PartialEq)]
struct CpuFreq {
    current_mhz: f64,
    max_mhz: String,
    min_mhz: String,
}

fn parse_lscpu(output: &str) -> Option<CpuFreq> {
    let mut current = None;
    let mut max = None;
    let mut min = None;

    for line in output.lines() {
        let value = |l: &str| l.split_once(':').map(|(_, v)| v.trim().to_string());
        if line.starts_with("CPU max MHz") {
            max = value(line);
        } else if line.starts_with("CPU min MHz") {
            min = value(line);
        } else if line.starts_with("CPU MHz") {
            current = value(line).and_then(|v| v.parse::<f64>().ok());
        }
    }

    Some(CpuFreq {
        current_mhz: current?,
        max_mhz: max?,
        min_mhz: min?,
    })
}

/// Collects the host's current CPU frequency.
///
/// ```text
/// # HELP pve_host_cpufreq CPU freq info
/// # TYPE pve_host_cpufreq gauge
/// pve_host_cpufreq{max_freq="3600.0000",min_freq="800.0000"} 2400
/// ```
///
/// `lscpu` does not report the frequency lines on every machine; when
/// any of them is missing the probe exports an empty family instead of
/// failing the scrape.
pub struct CpuFreqCollector {
    command: String,
}

impl CpuFreqCollector {
    pub fn new() -> Self {
        Self::with_command("lscpu")
    }

    pub fn with_command<S: Into<String>>(command: S) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for CpuFreqCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for CpuFreqCollector {
    fn name(&self) -> &'static str {
        "cpufreq"
    }

    fn collect(&self) -> Result<Vec<MetricFamily>> {
        let mut family = MetricFamily::gauge(
            "pve_host_cpufreq".to_string(),
            "CPU freq info".to_string(),
            ["max_freq", "min_freq"].map(String::from).to_vec(),
        );

        match run_command(&self.command, &[]) {
            Ok(output) => match parse_lscpu(&output) {
                Some(freq) => {
                    family.sample(vec![freq.max_mhz, freq.min_mhz], freq.current_mhz);
                }
                None => debug!(command = %self.command, "no CPU frequency fields in output"),
            },
            Err(e) => warn!(error = %e, command = %self.command, "CPU frequency probe failed"),
        }

        Ok(vec![family])
    }
}

fn parse_hddtemp(output: &str) -> Vec<(String, String, f64)> {
    let mut readings = Vec::new();

    for line in output.lines().filter(|l| !l.is_empty()) {
        let parts: Vec<&str> = line.split(':').collect();
        if parts.len() < 3 {
            debug!(line, "skipping unparseable hddtemp line");
            continue;
        }

        // Temperature is the numeric run of the last field, e.g. "36°C".
        let last = parts[parts.len() - 1].trim();
        let digits: String = last
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        let Ok(temperature) = digits.parse::<f64>() else {
            debug!(line, "skipping hddtemp line without a temperature");
            continue;
        };

        readings.push((
            parts[0].trim().to_string(),
            parts[1].trim().to_string(),
            temperature,
        ));
    }

    readings
}

#[cfg(unix)]
fn is_block_device(path: &PathBuf) -> bool {
    use std::os::unix::fs::FileTypeExt;
    std::fs::metadata(path)
        .map(|m| m.file_type().is_block_device())
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_block_device(_path: &PathBuf) -> bool {
    false
}

/// Collects disk temperatures via `hddtemp`.
///
/// ```text
/// # HELP pve_host_hdd_temp Host HDD temp information
/// # TYPE pve_host_hdd_temp gauge
/// pve_host_hdd_temp{device="/dev/sda",mode="ST1000DM003"} 36
/// ```
///
/// Probes the fixed /dev/sda../dev/sde candidate range and only invokes
/// the command against paths that stat as block devices; with no
/// surviving device the family stays empty and nothing is spawned.
pub struct HddTempCollector {
    command: String,
    candidates: Vec<PathBuf>,
}

impl HddTempCollector {
    pub fn new() -> Self {
        let candidates = ["a", "b", "c", "d", "e"]
            .iter()
            .map(|suffix| PathBuf::from(format!("/dev/sd{}", suffix)))
            .collect();
        Self {
            command: "hddtemp".to_string(),
            candidates,
        }
    }

    pub fn with_command<S: Into<String>>(command: S, candidates: Vec<PathBuf>) -> Self {
        Self {
            command: command.into(),
            candidates,
        }
    }
}

impl Default for HddTempCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for HddTempCollector {
    fn name(&self) -> &'static str {
        "hddtemp"
    }

    fn collect(&self) -> Result<Vec<MetricFamily>> {
        let mut family = MetricFamily::gauge(
            "pve_host_hdd_temp".to_string(),
            "Host HDD temp information".to_string(),
            ["device", "mode"].map(String::from).to_vec(),
        );

        let devices: Vec<&str> = self
            .candidates
            .iter()
            .filter(|path| is_block_device(path))
            .filter_map(|path| path.to_str())
            .collect();

        if devices.is_empty() {
            debug!("no block devices to probe for disk temperature");
            return Ok(vec![family]);
        }

        match run_command(&self.command, &devices) {
            Ok(output) => {
                for (device, mode, temperature) in parse_hddtemp(&output) {
                    family.sample(vec![device, mode], temperature);
                }
            }
            Err(e) => warn!(error = %e, command = %self.command, "disk temperature probe failed"),
        }

        Ok(vec![family])
    }
}

/// Run a local command and capture stdout as UTF-8 text, lossily.
fn run_command(command: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(command).args(args).output()?;
    if !output.status.success() {
        return Err(CoreError::probe(format!(
            "{} exited with {}",
            command, output.status
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
