pub mod availability;
pub mod booking;
pub mod dashboard;
pub mod lifecycle;
pub mod store;
pub mod supabase_store;

pub use availability::SlotAvailabilityResolver;
pub use booking::{BookingRules, BookingTransactionManager};
pub use dashboard::DoctorDashboardService;
pub use lifecycle::AppointmentLifecycleService;
pub use store::{AppointmentStore, InMemoryAppointmentStore, StoreError};
pub use supabase_store::SupabaseAppointmentStore;
