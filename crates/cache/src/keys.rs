//! Cache key conventions shared by composed reads and invalidation handlers.
//!
//! | Shape                                  | Used for                         |
//! |----------------------------------------|----------------------------------|
//! | `<resource>:<id>`                      | a single item or composite       |
//! | `<resource>:entity:<type>:<id>`        | items attached to a parent entity |
//! | `<resource>:list:<fragment>`           | one page of a list               |
//! | `<resource>:list:*`                    | every cached page of a list      |

pub const ASSETS: &str = "assets";
pub const DOCTORS: &str = "doctors";
pub const BLOGS: &str = "blogs";
pub const APPOINTMENTS: &str = "appointments";
pub const STAFF: &str = "staff";

/// `<resource>:<id>`
pub fn item(resource: &str, id: &str) -> String {
    format!("{resource}:{id}")
}

/// `<resource>:entity:<entity_type>:<entity_id>`
pub fn entity(resource: &str, entity_type: &str, entity_id: &str) -> String {
    format!("{resource}:entity:{entity_type}:{entity_id}")
}

/// `<resource>:list:<fragment>`
pub fn list(resource: &str, fragment: &str) -> String {
    format!("{resource}:list:{fragment}")
}

/// `<resource>:list:*`
pub fn list_pattern(resource: &str) -> String {
    format!("{resource}:list:*")
}

#[cfg(test)]
mod tests {
    use super::*;
    use glob::Pattern;

    #[test]
    fn test_key_shapes() {
        assert_eq!(item(ASSETS, "a1"), "assets:a1");
        assert_eq!(entity(ASSETS, "DOCTOR", "d1"), "assets:entity:DOCTOR:d1");
        assert_eq!(list(DOCTORS, "page=1"), "doctors:list:page=1");
        assert_eq!(list_pattern(BLOGS), "blogs:list:*");
    }

    #[test]
    fn test_list_pattern_covers_list_keys_only() {
        let pattern = Pattern::new(&list_pattern(DOCTORS)).unwrap();
        assert!(pattern.matches(&list(DOCTORS, "page=2:limit=10")));
        assert!(!pattern.matches(&item(DOCTORS, "d1")));
        assert!(!pattern.matches(&list(BLOGS, "page=1")));
    }
}
