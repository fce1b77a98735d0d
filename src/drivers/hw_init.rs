//! One-shot hardware peripheral initialization.
//!
//! Configures the encoder, button and lever inputs with their edge
//! interrupts, plus the LEDC timers/channels for the status LED and the
//! buzzer, using raw ESP-IDF sys calls.  Pump outputs are owned by
//! `esp_idf_hal` pin drivers and are not touched here.
//!
//! Every public function has a host stub so the rest of the crate builds
//! and tests off-target.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    LedcInitFailed(i32),
    IsrInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcInitFailed(rc)   => write!(f, "LEDC timer/channel config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the control loop; single-threaded.
    unsafe {
        init_gpio_inputs()?;
        init_ledc()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── GPIO Inputs ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    let input_pins = [
        pins::ENCODER_A_GPIO,
        pins::ENCODER_B_GPIO,
        pins::ENCODER_BUTTON_GPIO,
        pins::LEVER_GPIO,
    ];

    for &pin in &input_pins {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_ANYEDGE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    }

    info!("hw_init: GPIO inputs configured");
    Ok(())
}

// ── LEDC PWM ─────────────────────────────────────────────────

pub const LEDC_CH_LED: u32 = 0;
pub const LEDC_CH_BUZZER: u32 = 1;

#[cfg(target_os = "espidf")]
const LEDC_TIMER_LED: u32 = ledc_timer_t_LEDC_TIMER_0;
#[cfg(target_os = "espidf")]
const LEDC_TIMER_BUZZER: u32 = ledc_timer_t_LEDC_TIMER_1;

#[cfg(target_os = "espidf")]
unsafe fn init_ledc() -> Result<(), HwInitError> {
    let timers = [
        (LEDC_TIMER_LED, pins::LED_PWM_FREQ_HZ),
        (LEDC_TIMER_BUZZER, pins::BUZZER_BASE_FREQ_HZ),
    ];
    for (timer_num, freq_hz) in timers {
        let cfg = ledc_timer_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            timer_num,
            duty_resolution: ledc_timer_bit_t_LEDC_TIMER_8_BIT,
            freq_hz,
            clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
            ..Default::default()
        };
        // SAFETY: Called from single main-task context via init_peripherals().
        let ret = unsafe { ledc_timer_config(&cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::LedcInitFailed(ret)); }
    }

    let channels = [
        (LEDC_CH_LED, LEDC_TIMER_LED, pins::STATUS_LED_GPIO),
        (LEDC_CH_BUZZER, LEDC_TIMER_BUZZER, pins::BUZZER_GPIO),
    ];
    for (channel, timer_sel, gpio_num) in channels {
        let ret = unsafe { ledc_channel_config(&ledc_channel_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel,
            timer_sel,
            gpio_num,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        }) };
        if ret != ESP_OK as i32 { return Err(HwInitError::LedcInitFailed(ret)); }
    }

    info!("hw_init: LEDC configured (led=CH0, buzzer=CH1)");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: u32, duty: u8) {
    // SAFETY: LEDC channels were configured in init_ledc(); duty register
    // writes are race-free since only the main loop calls this function.
    unsafe {
        ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, duty as u32);
        ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set(_channel: u32, _duty: u8) {}

/// Start a square-wave tone on the buzzer channel (50 % duty).
#[cfg(target_os = "espidf")]
pub fn buzzer_tone(freq_hz: u32) {
    // SAFETY: timer and channel configured in init_ledc(); main loop only.
    unsafe {
        ledc_set_freq(ledc_mode_t_LEDC_LOW_SPEED_MODE, LEDC_TIMER_BUZZER, freq_hz);
    }
    ledc_set(LEDC_CH_BUZZER, 128);
}

#[cfg(not(target_os = "espidf"))]
pub fn buzzer_tone(_freq_hz: u32) {}

pub fn buzzer_off() {
    ledc_set(LEDC_CH_BUZZER, 0);
}

// ── GPIO ISR Service ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
use crate::drivers::input::{button_isr_handler, encoder_isr_handler, lever_isr_handler};

#[cfg(target_os = "espidf")]
unsafe extern "C" fn encoder_gpio_isr(_arg: *mut core::ffi::c_void) {
    // SAFETY: gpio_get_level is a register read; safe in ISR context.
    let (a, b) = unsafe {
        (
            gpio_get_level(pins::ENCODER_A_GPIO) != 0,
            gpio_get_level(pins::ENCODER_B_GPIO) != 0,
        )
    };
    encoder_isr_handler(a, b);
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn button_gpio_isr(_arg: *mut core::ffi::c_void) {
    // SAFETY: RTC counter and register reads; safe in ISR context.
    let (pressed, now_ms) = unsafe {
        (
            gpio_get_level(pins::ENCODER_BUTTON_GPIO) == 0,
            (esp_timer_get_time() / 1_000) as u32,
        )
    };
    button_isr_handler(pressed, now_ms);
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn lever_gpio_isr(_arg: *mut core::ffi::c_void) {
    // SAFETY: gpio_get_level is a register read; safe in ISR context.
    let held = unsafe { gpio_get_level(pins::LEVER_GPIO) } == 0;
    lever_isr_handler(held);
}

/// Install per-pin GPIO ISR service and register interrupt handlers.
/// Call after init_peripherals() and before the control loop.
#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), HwInitError> {
    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed (acceptable).  The handlers below only
    // touch the critical-section protected input latch.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        // Encoder A: any edge, B sampled inside the handler
        gpio_isr_handler_add(pins::ENCODER_A_GPIO, Some(encoder_gpio_isr), core::ptr::null_mut());
        gpio_intr_enable(pins::ENCODER_A_GPIO);

        // Button: any edge (press and release both matter)
        gpio_isr_handler_add(pins::ENCODER_BUTTON_GPIO, Some(button_gpio_isr), core::ptr::null_mut());
        gpio_intr_enable(pins::ENCODER_BUTTON_GPIO);

        // Lever: any edge
        gpio_isr_handler_add(pins::LEVER_GPIO, Some(lever_gpio_isr), core::ptr::null_mut());
        gpio_intr_enable(pins::LEVER_GPIO);

        // Seed the lever level so a lever held at boot is seen before its
        // first edge.
        lever_isr_handler(gpio_get_level(pins::LEVER_GPIO) == 0);

        info!("hw_init: ISR service installed (encoder, button, lever)");
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}
