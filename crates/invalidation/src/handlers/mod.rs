//! Cache invalidation handlers, one per entity family.

pub mod appointments;
pub mod assets;
pub mod blogs;
pub mod doctors;
pub mod staff;

pub use appointments::AppointmentCacheHandler;
pub use assets::AssetCacheHandler;
pub use blogs::BlogCacheHandler;
pub use doctors::DoctorCacheHandler;
pub use staff::StaffCacheHandler;

use crate::handler::EventHandler;

/// Every built-in handler, in registration order.
pub fn default_handlers() -> Vec<Box<dyn EventHandler>> {
    vec![
        Box::new(AssetCacheHandler),
        Box::new(DoctorCacheHandler),
        Box::new(StaffCacheHandler),
        Box::new(AppointmentCacheHandler),
        Box::new(BlogCacheHandler),
    ]
}
