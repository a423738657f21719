//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements         | Connects to                    |
//! |--------------|--------------------|--------------------------------|
//! | `gpio`       | SwitchPort         | relay line files               |
//! |              | InputPort          | input line files               |
//! | `hardware`   | all device ports   | gpio + w1_sensor + process     |
//! | `kvs`        | ConfigPort         | one-file-per-key store         |
//! |              | StoragePort        |                                |
//! | `log_sink`   | EventSink          | `log` facade                   |
//! | `process`    | ProcessRegistry    | OS process table (`sysinfo`)   |
//! | `time`       | Clock              | monotonic system clock         |
//! | `w1_sensor`  | SensorPort         | 1-Wire probes in sysfs         |

pub mod gpio;
pub mod hardware;
pub mod kvs;
pub mod log_sink;
pub mod process;
pub mod time;
pub mod w1_sensor;
