mod activity;

pub use activity::{Activity, ActivityType, NewActivity, ACTIVITY_COLUMNS};
