use serde::Serialize;
use serde_json::{Value, json};

use crate::domain::{CallLogEntry, Contact, Coordinates, PhoneNumber, ValidationError};

#[derive(Debug, Serialize)]
struct ContactJson<'a> {
    country_code: Option<&'a str>,
    date_of_birth: Option<&'a str>,
    name: &'a str,
    phone_number: u64,
}

impl<'a> From<&'a Contact> for ContactJson<'a> {
    fn from(contact: &'a Contact) -> Self {
        Self {
            country_code: contact.country_code.as_ref().map(|c| c.as_str()),
            date_of_birth: contact.date_of_birth.as_ref().map(|d| d.as_str()),
            name: contact.name(),
            phone_number: contact.phone_number().as_u64(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CallJson<'a> {
    called_at: &'a str,
    duration: u32,
    name: &'a str,
    phone_number: u64,
    tag: Option<&'a str>,
    #[serde(rename = "type")]
    call_type: &'static str,
}

impl<'a> From<&'a CallLogEntry> for CallJson<'a> {
    fn from(entry: &'a CallLogEntry) -> Self {
        Self {
            called_at: &entry.called_at,
            duration: entry.duration_seconds,
            name: &entry.name,
            phone_number: entry.phone_number.as_u64(),
            tag: entry.tag.as_deref(),
            call_type: entry.call_type.as_str(),
        }
    }
}

fn require_some<T>(items: &[T], field: &'static str) -> Result<(), ValidationError> {
    if items.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(())
}

/// `remove == false` uploads the contacts, `true` deletes them.
pub fn encode_contacts_sync(contacts: &[Contact], remove: bool) -> Result<Value, ValidationError> {
    require_some(contacts, "contacts")?;
    let list = contacts.iter().map(ContactJson::from).collect::<Vec<_>>();
    let (add, removed) = if remove {
        (Vec::new(), list)
    } else {
        (list, Vec::new())
    };
    Ok(json!({"add": add, "is_first": false, "remove": removed}))
}

pub fn encode_call_log_sync(
    calls: &[CallLogEntry],
    remove: bool,
) -> Result<Value, ValidationError> {
    require_some(calls, "calls")?;
    let list = calls.iter().map(CallJson::from).collect::<Vec<_>>();
    let (add, removed) = if remove {
        (Vec::new(), list)
    } else {
        (list, Vec::new())
    };
    Ok(json!({"add": add, "remove": removed}))
}

/// Single-profile block toggle. The number is sent as a string here.
pub fn encode_block_profile(
    phone_number: PhoneNumber,
    block_contact: bool,
    me_full_block: bool,
) -> Value {
    json!({
        "block_contact": block_contact,
        "me_full_block": me_full_block,
        (PhoneNumber::FIELD): phone_number.to_string(),
    })
}

pub fn encode_block_numbers(numbers: &[PhoneNumber]) -> Result<Value, ValidationError> {
    require_some(numbers, "phone_numbers")?;
    let numbers = numbers.iter().map(|n| n.as_u64()).collect::<Vec<_>>();
    Ok(json!({"phone_numbers": numbers}))
}

pub fn encode_contact_ids(ids: &[u64]) -> Result<Value, ValidationError> {
    require_some(ids, "contact_ids")?;
    Ok(json!({"contact_ids": ids}))
}

pub fn encode_location(coordinates: Coordinates) -> Value {
    json!({
        "location_latitude": coordinates.latitude(),
        "location_longitude": coordinates.longitude(),
    })
}
