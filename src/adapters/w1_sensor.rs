//! 1-Wire temperature probes via Linux sysfs.
//!
//! Each sensor id maps to `<sensor_dir>/<id>`, normally a symlink to a
//! DS18B20's `/sys/bus/w1/devices/28-*/temperature` file, which holds the
//! last conversion in milli-degrees Celsius. Any read or parse failure is
//! a [`SensorReading::Missing`]; the fault layer decides what that means.

use std::fs;
use std::path::PathBuf;

use log::debug;

use crate::app::ports::SensorPort;
use crate::sensors::SensorReading;
use crate::sensors::temperature::parse_millidegrees;

pub struct W1Sensors {
    dir: PathBuf,
}

impl W1Sensors {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SensorPort for W1Sensors {
    fn get_temperature(&mut self, sensor_id: u8) -> SensorReading {
        let path = self.dir.join(sensor_id.to_string());
        match fs::read_to_string(&path) {
            Ok(text) => {
                let reading = parse_millidegrees(&text);
                if reading.is_missing() {
                    debug!("sensor {}: unusable value {:?}", sensor_id, text.trim());
                }
                reading
            }
            Err(e) => {
                debug!("sensor {}: {} ({})", sensor_id, e, path.display());
                SensorReading::Missing
            }
        }
    }
}
