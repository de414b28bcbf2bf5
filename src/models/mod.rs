pub mod activities;
pub mod activity_comments;
pub mod activity_registrations;
pub mod users;

pub use activities::ActivitiesRow;
pub use activity_comments::ActivityCommentsRow;
pub use activity_registrations::ActivityRegistrationsRow;
pub use users::{UserRef, UsersRow};
