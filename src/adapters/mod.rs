//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements       | Connects to                     |
//! |---------------|------------------|---------------------------------|
//! | `hardware`    | InputPort        | GPIO interrupt input latch      |
//! |               | ActuatorPort     | pump GPIOs, LEDC LED and buzzer |
//! |               | DelayNs          | FreeRTOS task delay             |
//! | `log_display` | DisplayPort      | Serial log output               |
//! | `log_sink`    | EventSink        | Serial log output               |
//! | `nvs`         | SettingsPort     | NVS / in-memory store           |
//! |               | FlowLogPort      |                                 |
//! | `profiles`    | ProfilePort      | JSON documents in flash         |
//! | `time`        | —                | ESP32 system timer              |

pub mod hardware;
pub mod log_display;
pub mod log_sink;
pub mod nvs;
pub mod profiles;
pub mod time;
