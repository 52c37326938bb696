use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use models::contact::NewContact;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactCreate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub birthday: NaiveDate,
    #[serde(default)]
    pub other_info: Option<String>,
}

impl From<ContactCreate> for NewContact {
    fn from(c: ContactCreate) -> Self {
        NewContact {
            first_name: c.first_name,
            last_name: c.last_name,
            email: c.email,
            phone_number: c.phone_number,
            birthday: c.birthday,
            other_info: c.other_info,
        }
    }
}

/// Partial update; absent fields keep their stored value.
/// `other_info: null` clears the field, which `Some(None)` represents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub birthday: Option<NaiveDate>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub other_info: Option<Option<String>>,
}

// Only called when the key is present, so `null` becomes `Some(None)`.
fn present<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Case-insensitive substring filters, combined with AND.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactSearch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

impl ContactSearch {
    /// Non-blank filters as `(field, trimmed needle)`.
    pub fn filters(&self) -> Vec<(&'static str, String)> {
        [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("email", &self.email),
            ("phone_number", &self.phone_number),
        ]
        .into_iter()
        .filter_map(|(field, v)| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| (field, s.to_string()))
        })
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.filters().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_other_info_differs_from_absent() {
        let absent: ContactUpdate = serde_json::from_str(r#"{"first_name":"Ada"}"#).unwrap();
        assert_eq!(absent.other_info, None);
        let cleared: ContactUpdate = serde_json::from_str(r#"{"other_info":null}"#).unwrap();
        assert_eq!(cleared.other_info, Some(None));
        let set: ContactUpdate = serde_json::from_str(r#"{"other_info":"notes"}"#).unwrap();
        assert_eq!(set.other_info, Some(Some("notes".to_string())));
    }

    #[test]
    fn blank_filters_are_ignored() {
        let s = ContactSearch { first_name: Some("  ".into()), email: Some(" Ada@".into()), ..Default::default() };
        assert_eq!(s.filters(), vec![("email", "Ada@".to_string())]);
        assert!(ContactSearch::default().is_empty());
    }
}
