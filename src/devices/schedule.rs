use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};

/// Weekly plug-in pattern of one vehicle.
///
/// A vehicle is connected on each of its `weekdays` from `arrival` through
/// `departure`, both ends inclusive. The pattern is immutable once built.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use ev_charge_sim::devices::ConnectionSchedule;
///
/// let schedule = ConnectionSchedule::default(); // Mon-Fri 08:00-17:00
/// let monday_noon = Utc.with_ymd_and_hms(2023, 1, 2, 12, 0, 0).unwrap();
/// let sunday_noon = Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).unwrap();
/// assert!(schedule.is_plugged(monday_noon));
/// assert!(!schedule.is_plugged(sunday_noon));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSchedule {
    arrival: NaiveTime,
    departure: NaiveTime,
    /// Bit `n` set means the weekday `n` days from Monday is a connected day.
    weekdays: u8,
}

impl ConnectionSchedule {
    /// Monday through Friday.
    pub const WORKING_WEEK: [Weekday; 5] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ];

    /// Default arrival, 08:00.
    pub const DEFAULT_ARRIVAL: NaiveTime = match NaiveTime::from_hms_opt(8, 0, 0) {
        Some(t) => t,
        None => panic!("invalid default arrival"),
    };

    /// Default departure, 17:00.
    pub const DEFAULT_DEPARTURE: NaiveTime = match NaiveTime::from_hms_opt(17, 0, 0) {
        Some(t) => t,
        None => panic!("invalid default departure"),
    };

    /// Creates a schedule connected on `weekdays` between `arrival` and `departure`.
    ///
    /// # Panics
    ///
    /// Panics if `arrival > departure` or `weekdays` is empty.
    pub fn new(arrival: NaiveTime, departure: NaiveTime, weekdays: &[Weekday]) -> Self {
        assert!(arrival <= departure, "arrival must not be after departure");
        assert!(!weekdays.is_empty(), "at least one connected weekday is required");

        let weekdays = weekdays
            .iter()
            .fold(0u8, |mask, d| mask | (1 << d.num_days_from_monday()));
        Self {
            arrival,
            departure,
            weekdays,
        }
    }

    /// Time of day the vehicle plugs in.
    pub fn arrival(&self) -> NaiveTime {
        self.arrival
    }

    /// Time of day the vehicle unplugs.
    pub fn departure(&self) -> NaiveTime {
        self.departure
    }

    /// Returns `true` if the vehicle connects on `day`.
    pub fn connects_on(&self, day: Weekday) -> bool {
        self.weekdays & (1 << day.num_days_from_monday()) != 0
    }

    /// Returns `true` if the vehicle is plugged in at `timestamp`.
    pub fn is_plugged(&self, timestamp: DateTime<Utc>) -> bool {
        if !self.connects_on(timestamp.weekday()) {
            return false;
        }
        let time = timestamp.time();
        self.arrival <= time && time <= self.departure
    }

    /// Applies [`ConnectionSchedule::is_plugged`] to every timestep.
    pub fn plugged_profile(&self, timesteps: &[DateTime<Utc>]) -> Vec<bool> {
        timesteps.iter().map(|t| self.is_plugged(*t)).collect()
    }
}

impl Default for ConnectionSchedule {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_ARRIVAL,
            Self::DEFAULT_DEPARTURE,
            &Self::WORKING_WEEK,
        )
    }
}
