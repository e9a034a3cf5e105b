use std::fmt;

/// Named backend data set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Collection(&'static str);

impl Collection {
    pub const PROFILES: Collection = Collection("profiles");
    pub const ATTENDANCE: Collection = Collection("attendance");
    pub const ASSIGNMENTS: Collection = Collection("assignments");
    pub const ANNOUNCEMENTS: Collection = Collection("announcements");
    pub const NOTIFICATIONS: Collection = Collection("notifications");
    pub const COURSES: Collection = Collection("courses");
    pub const MATERIALS: Collection = Collection("materials");

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.0)
    }
}
