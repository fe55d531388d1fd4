use chrono::{DateTime, Utc};

use crate::devices::schedule::ConnectionSchedule;

/// The traction battery of one vehicle and its charging behaviour.
///
/// `Battery` tracks state of charge (SOC) against a target and advances one
/// timestep at a time given the energy a charger offers. It never accepts
/// more than is needed to reach the target.
///
/// Each step:
/// 1. `loss_rate` is subtracted from SOC whether or not the vehicle is plugged.
/// 2. If the schedule says the vehicle is away, SOC is reset to the initial
///    value and nothing is drawn.
/// 3. If the target is already reached, nothing is drawn.
/// 4. Otherwise the offer is taken, clipped to the remaining requested energy.
#[derive(Debug, Clone)]
pub struct Battery {
    /// Battery capacity in kilowatt-hours.
    pub capacity_kwh: f64,

    /// State of charge as a fraction (0.0 to 1.0).
    current_soc: f64,

    /// Target state of charge as a fraction (0.0 to 1.0).
    target_soc: f64,

    /// SOC restored whenever the vehicle is away.
    initial_soc: f64,

    /// SOC fraction lost every timestep.
    pub loss_rate: f64,

    schedule: ConnectionSchedule,
}

impl Battery {
    /// Creates a new battery.
    ///
    /// `current_soc` and `target_soc` are clamped to `[0, 1]`; the clamped
    /// `current_soc` becomes the initial SOC used on every reset.
    ///
    /// # Panics
    ///
    /// Panics if `capacity_kwh` is not positive or `loss_rate` is negative.
    pub fn new(
        capacity_kwh: f64,
        current_soc: f64,
        target_soc: f64,
        loss_rate: f64,
        schedule: ConnectionSchedule,
    ) -> Self {
        assert!(capacity_kwh > 0.0);
        assert!(loss_rate >= 0.0);

        let current_soc = current_soc.clamp(0.0, 1.0);
        Self {
            capacity_kwh,
            current_soc,
            target_soc: target_soc.clamp(0.0, 1.0),
            initial_soc: current_soc,
            loss_rate,
            schedule,
        }
    }

    /// Current state of charge.
    pub fn current_soc(&self) -> f64 {
        self.current_soc
    }

    /// Target state of charge.
    pub fn target_soc(&self) -> f64 {
        self.target_soc
    }

    /// State of charge restored on disconnection.
    pub fn initial_soc(&self) -> f64 {
        self.initial_soc
    }

    /// The plug-in pattern driving this battery.
    pub fn schedule(&self) -> &ConnectionSchedule {
        &self.schedule
    }

    /// Energy currently stored in kWh.
    pub fn current_energy_kwh(&self) -> f64 {
        self.capacity_kwh * self.current_soc
    }

    /// Energy stored at the target SOC in kWh.
    pub fn target_energy_kwh(&self) -> f64 {
        self.capacity_kwh * self.target_soc
    }

    /// Energy still needed to reach the target; negative above target.
    pub fn requested_energy_kwh(&self) -> f64 {
        self.target_energy_kwh() - self.current_energy_kwh()
    }

    /// Hours a charger rated `max_output_kw` needs to cover the current
    /// request at full power. Zero when the target is already met.
    ///
    /// # Panics
    ///
    /// Panics if `max_output_kw` is not positive.
    pub fn charging_time_hours(&self, max_output_kw: f64) -> f64 {
        assert!(max_output_kw > 0.0, "charger output must be positive");
        self.requested_energy_kwh().max(0.0) / max_output_kw
    }

    /// Returns `true` once SOC has reached (or exceeds) the target.
    pub fn target_reached(&self) -> bool {
        self.current_soc >= self.target_soc
    }

    /// Restores the initial SOC.
    pub fn reset(&mut self) {
        self.current_soc = self.initial_soc;
    }

    /// Advances one timestep and returns the energy actually accepted (kWh).
    ///
    /// The returned value is within `[0, offered_kwh]`.
    pub fn step(&mut self, timestamp: DateTime<Utc>, offered_kwh: f64) -> f64 {
        self.current_soc = (self.current_soc - self.loss_rate).max(0.0);

        if !self.schedule.is_plugged(timestamp) {
            self.reset();
            return 0.0;
        }
        if self.target_reached() {
            return 0.0;
        }
        self.charge(offered_kwh.max(0.0))
    }

    fn charge(&mut self, offered_kwh: f64) -> f64 {
        let stored_kwh = self.current_energy_kwh() + offered_kwh;
        if stored_kwh <= self.target_energy_kwh() {
            self.current_soc = stored_kwh / self.capacity_kwh;
            offered_kwh
        } else {
            let accepted_kwh = self.requested_energy_kwh();
            self.current_soc = self.target_soc;
            accepted_kwh
        }
    }
}
