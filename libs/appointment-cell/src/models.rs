// libs/appointment-cell/src/models.rs
use std::fmt;
use std::ops::RangeInclusive;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// SCHEDULE
// ==============================================================================

/// Start hours of the fixed daily schedule: 09:00 through 17:00, closing at 18:00.
pub const DAILY_SLOT_HOURS: RangeInclusive<u32> = 9..=17;

/// Maximum active appointments a patient may hold on one calendar date.
pub const MAX_ACTIVE_PER_PATIENT_PER_DAY: usize = 2;

/// One of the hourly appointment windows in the daily schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSlot(NaiveTime);

impl TimeSlot {
    pub fn from_hour(hour: u32) -> Option<Self> {
        if !DAILY_SLOT_HOURS.contains(&hour) {
            return None;
        }
        NaiveTime::from_hms_opt(hour, 0, 0).map(TimeSlot)
    }

    /// Every slot of the day in chronological order.
    pub fn all() -> impl Iterator<Item = TimeSlot> {
        DAILY_SLOT_HOURS.filter_map(TimeSlot::from_hour)
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn start_time(&self) -> NaiveTime {
        self.0
    }

    /// Moment the slot begins on `date`.
    pub fn on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.0)
    }

    /// "HH:00" label for display.
    pub fn label(&self) -> String {
        format!("{:02}:00", self.hour())
    }
}

impl TryFrom<NaiveTime> for TimeSlot {
    type Error = String;

    fn try_from(time: NaiveTime) -> Result<Self, Self::Error> {
        if time.minute() != 0 || time.second() != 0 || time.nanosecond() != 0 {
            return Err(format!("{} is not on an hourly boundary", time));
        }
        TimeSlot::from_hour(time.hour())
            .ok_or_else(|| format!("{} is outside clinic hours (09:00-17:00)", time.format("%H:%M")))
    }
}

impl TryFrom<String> for TimeSlot {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let time = NaiveTime::parse_from_str(&value, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(&value, "%H:%M"))
            .map_err(|_| format!("invalid time slot '{}'", value))?;
        TimeSlot::try_from(time)
    }
}

impl From<TimeSlot> for String {
    fn from(slot: TimeSlot) -> Self {
        slot.0.format("%H:%M:%S").to_string()
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl AppointmentStatus {
    /// Pending and confirmed appointments hold their slot and count toward the daily limit.
    pub fn is_active(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Appointment {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.time_slot.on(self.date)
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        now >= self.starts_at()
    }

    pub fn involves(&self, user_id: Uuid) -> bool {
        self.patient_id == user_id || self.doctor_id == user_id
    }
}

/// Row handed to the store; the store assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAppointment {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub reason: Option<String>,
    pub created_at: NaiveDateTime,
}

impl NewAppointment {
    pub fn into_appointment(self, id: Uuid) -> Appointment {
        Appointment {
            id,
            patient_id: self.patient_id,
            doctor_id: self.doctor_id,
            date: self.date,
            time_slot: self.time_slot,
            status: AppointmentStatus::Pending,
            reason: self.reason,
            created_at: self.created_at,
        }
    }
}

/// Appointment plus the display-time `is_expired` flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentView {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub is_expired: bool,
}

impl AppointmentView {
    pub fn at(appointment: Appointment, now: NaiveDateTime) -> Self {
        let is_expired = appointment.is_expired(now);
        Self { appointment, is_expired }
    }
}

/// Sort newest first: date descending, then slot descending.
pub fn sort_newest_first(appointments: &mut [Appointment]) {
    appointments.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.time_slot.cmp(&a.time_slot))
    });
}

// ==============================================================================
// QUERIES AND FILTERS
// ==============================================================================

/// Store-level filter; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentFilter {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub time_slot: Option<TimeSlot>,
    pub active_only: bool,
}

impl AppointmentFilter {
    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.patient_id.map_or(true, |id| appointment.patient_id == id)
            && self.doctor_id.map_or(true, |id| appointment.doctor_id == id)
            && self.date.map_or(true, |date| appointment.date == date)
            && self.time_slot.map_or(true, |slot| appointment.time_slot == slot)
            && (!self.active_only || appointment.is_active())
    }
}

/// Listing scopes exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppointmentListing {
    ForPatient(Uuid),
    ForDoctor(Uuid),
    ByDate(Option<NaiveDate>),
}

impl From<AppointmentListing> for AppointmentFilter {
    fn from(listing: AppointmentListing) -> Self {
        match listing {
            AppointmentListing::ForPatient(id) => AppointmentFilter {
                patient_id: Some(id),
                ..Default::default()
            },
            AppointmentListing::ForDoctor(id) => AppointmentFilter {
                doctor_id: Some(id),
                ..Default::default()
            },
            AppointmentListing::ByDate(date) => AppointmentFilter {
                date,
                ..Default::default()
            },
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityQuery {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentDateQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CancelOutcome {
    Cancelled(Appointment),
    /// The appointment was already cancelled; nothing changed.
    AlreadyCancelled(Appointment),
}

impl CancelOutcome {
    pub fn appointment(&self) -> &Appointment {
        match self {
            CancelOutcome::Cancelled(a) | CancelOutcome::AlreadyCancelled(a) => a,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorDashboard {
    pub date: NaiveDate,
    pub todays_appointments: Vec<AppointmentView>,
    pub todays_appointments_count: usize,
    pub unique_patients_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientSummary {
    pub id: Uuid,
    pub display_name: String,
    pub email: Option<String>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BookingError {
    #[error("Invalid doctor selected")]
    InvalidDoctor,

    #[error("Cannot book appointments for past dates ({0})")]
    PastDate(NaiveDate),

    #[error("You can only book two appointments per day ({0})")]
    DailyLimitExceeded(NaiveDate),

    #[error("The {slot} slot on {date} is already booked for this doctor")]
    SlotAlreadyBooked { date: NaiveDate, slot: TimeSlot },

    #[error("You do not have permission to modify this appointment")]
    PermissionDenied,

    #[error("You cannot cancel past or ongoing appointments")]
    AlreadyOccurred,

    #[error("Only pending appointments can be confirmed (current status: {0})")]
    InvalidTransition(AppointmentStatus),

    #[error("Appointment not found")]
    NotFound,

    #[error("Store error: {0}")]
    Store(String),
}

impl BookingError {
    /// Warning-level outcomes are reported to the caller without failing the request.
    pub fn is_warning(&self) -> bool {
        matches!(self, BookingError::InvalidTransition(_))
    }
}
