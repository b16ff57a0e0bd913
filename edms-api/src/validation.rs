//! Input validation for the records the dashboard submits.
//!
//! Every validator is a pure function of its input (plus "today" for the
//! date checks) and reports the first failing rule. Existence checks against
//! the database live in the ORM layer.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use thiserror::Error;

use crate::models::{DeviceInput, NewDevice};

pub const MAX_SERIAL_NUMBER_LEN: usize = 50;
pub const MAX_DESCRIPTION_LEN: usize = 255;
pub const MAX_SIZE_LEN: usize = 50;
pub const MAX_STATUS_LEN: usize = 50;

pub const MAX_SITE_NAME_LEN: usize = 100;
pub const MAX_SITE_ADDRESS_LEN: usize = 255;
pub const MAX_CODE_LEN: usize = 50;
pub const MAX_DEVICE_TYPE_NAME_LEN: usize = 100;

static SITE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9\s_-]+$").expect("valid site name regex"));
static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{3,20}$").expect("valid username regex"));
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex")
});

/// Reasons a device submission is rejected, in the order they are checked.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceValidationError {
    #[error("room is required")]
    RoomRequired,
    #[error("device type is required")]
    DeviceTypeRequired,
    #[error("invalid room ID")]
    InvalidRoomID,
    #[error("invalid emergency device type ID")]
    InvalidDeviceTypeID,
    #[error("invalid extinguisher type ID")]
    InvalidExtinguisherTypeID,
    #[error("invalid manufacture date format")]
    InvalidManufactureDate,
    #[error("manufacture date cannot be in the future")]
    ManufactureDateInFuture,
    #[error("serial number is too long, maximum 50 characters")]
    SerialNumberTooLong,
    #[error("description is too long, maximum 255 characters")]
    DescriptionTooLong,
    #[error("size is too long, maximum 50 characters")]
    SizeTooLong,
    #[error("status is too long, maximum 50 characters")]
    StatusTooLong,
    #[error("room does not exist")]
    RoomDoesNotExist,
    #[error("emergency device type does not exist")]
    DeviceTypeDoesNotExist,
    #[error("extinguisher type does not exist")]
    ExtinguisherTypeDoesNotExist,
}

/// Validates raw device fields and resolves them into a [`NewDevice`].
///
/// `today` is the reference date for the future-date check: a manufacture
/// date equal to `today` is accepted, the day after is not.
///
/// Length limits count characters, not bytes, so a multibyte serial number
/// or description gets the same allowance as an ASCII one.
pub fn validate_device(
    input: &DeviceInput,
    today: NaiveDate,
) -> Result<NewDevice, DeviceValidationError> {
    use DeviceValidationError::*;

    if input.room_id.is_empty() {
        return Err(RoomRequired);
    }
    if input.device_type_id.is_empty() {
        return Err(DeviceTypeRequired);
    }

    let room_id = input.room_id.parse::<i32>().map_err(|_| InvalidRoomID)?;
    let device_type_id = input
        .device_type_id
        .parse::<i32>()
        .map_err(|_| InvalidDeviceTypeID)?;

    let extinguisher_type_id = match input.extinguisher_type_id.as_str() {
        "" => None,
        raw => Some(raw.parse::<i32>().map_err(|_| InvalidExtinguisherTypeID)?),
    };

    let manufacture_date = parse_optional_date(&input.manufacture_date)
        .map_err(|_| InvalidManufactureDate)?;
    if manufacture_date.is_some_and(|date| date > today) {
        return Err(ManufactureDateInFuture);
    }

    if too_long(&input.serial_number, MAX_SERIAL_NUMBER_LEN) {
        return Err(SerialNumberTooLong);
    }
    if too_long(&input.description, MAX_DESCRIPTION_LEN) {
        return Err(DescriptionTooLong);
    }
    if too_long(&input.size, MAX_SIZE_LEN) {
        return Err(SizeTooLong);
    }
    if too_long(&input.status, MAX_STATUS_LEN) {
        return Err(StatusTooLong);
    }

    Ok(NewDevice {
        device_type_id,
        extinguisher_type_id,
        room_id,
        serial_number: non_empty(&input.serial_number),
        manufacture_date,
        description: non_empty(&input.description),
        size: non_empty(&input.size),
        status: non_empty(&input.status),
    })
}

/// Parses an ISO `YYYY-MM-DD` date; the empty string means absent.
pub fn parse_optional_date(raw: &str) -> Result<Option<NaiveDate>, chrono::ParseError> {
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map(Some)
}

fn too_long(value: &str, max: usize) -> bool {
    value.chars().count() > max
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SiteValidationError {
    #[error("All fields are required")]
    MissingFields,
    #[error(
        "Site name should be less than 100 characters and address should be less than 255 characters"
    )]
    TooLong,
    #[error("Site name can only contain letters, numbers, spaces, hyphens, and underscores")]
    InvalidName,
}

/// Trims and validates a site name and address, returning the trimmed pair.
pub fn validate_site_fields(
    name: &str,
    address: &str,
) -> Result<(String, String), SiteValidationError> {
    let name = name.trim();
    let address = address.trim();

    if name.is_empty() || address.is_empty() {
        return Err(SiteValidationError::MissingFields);
    }
    if too_long(name, MAX_SITE_NAME_LEN) || too_long(address, MAX_SITE_ADDRESS_LEN) {
        return Err(SiteValidationError::TooLong);
    }
    if !SITE_NAME_RE.is_match(name) {
        return Err(SiteValidationError::InvalidName);
    }

    Ok((name.to_string(), address.to_string()))
}

/// Validates a building or room code. `kind` names the field in the message.
pub fn validate_code(kind: &str, code: &str) -> Result<String, String> {
    let code = code.trim();
    if code.is_empty() {
        return Err(format!("{} code is required", kind));
    }
    if too_long(code, MAX_CODE_LEN) {
        return Err(format!("{} code is too long, maximum {} characters", kind, MAX_CODE_LEN));
    }
    Ok(code.to_string())
}

pub fn validate_device_type_name(name: &str) -> Result<String, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Device type name is required".to_string());
    }
    if too_long(name, MAX_DEVICE_TYPE_NAME_LEN) {
        return Err(format!(
            "Device type name is too long, maximum {} characters",
            MAX_DEVICE_TYPE_NAME_LEN
        ));
    }
    Ok(name.to_string())
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    #[error("Username must be 3-20 characters of letters, numbers and underscores")]
    InvalidUsername,
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Password must be at least 8 characters")]
    PasswordTooShort,
    #[error("Role must be 'admin' or 'user'")]
    InvalidRole,
}

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn validate_user_fields(
    username: &str,
    email: &str,
    password: &str,
    role: &str,
) -> Result<(), UserValidationError> {
    if !USERNAME_RE.is_match(username) {
        return Err(UserValidationError::InvalidUsername);
    }
    if !EMAIL_RE.is_match(email) {
        return Err(UserValidationError::InvalidEmail);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(UserValidationError::PasswordTooShort);
    }
    if role != "admin" && role != "user" {
        return Err(UserValidationError::InvalidRole);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn valid_input() -> DeviceInput {
        DeviceInput {
            room_id: "3".to_string(),
            device_type_id: "1".to_string(),
            extinguisher_type_id: "2".to_string(),
            serial_number: "SN00042".to_string(),
            manufacture_date: "2022-03-01".to_string(),
            size: "5kg".to_string(),
            description: "Corridor extinguisher".to_string(),
            status: "Active".to_string(),
        }
    }

    #[test]
    fn test_valid_device_is_resolved() {
        let device = validate_device(&valid_input(), today()).expect("valid device");
        assert_eq!(device.room_id, 3);
        assert_eq!(device.device_type_id, 1);
        assert_eq!(device.extinguisher_type_id, Some(2));
        assert_eq!(device.serial_number.as_deref(), Some("SN00042"));
        assert_eq!(device.manufacture_date, NaiveDate::from_ymd_opt(2022, 3, 1));
        assert_eq!(device.size.as_deref(), Some("5kg"));
        assert_eq!(device.description.as_deref(), Some("Corridor extinguisher"));
        assert_eq!(device.status.as_deref(), Some("Active"));
    }

    #[test]
    fn test_empty_optional_fields_are_absent() {
        let input = DeviceInput {
            room_id: "1".to_string(),
            device_type_id: "1".to_string(),
            ..Default::default()
        };
        let device = validate_device(&input, today()).expect("valid device");
        assert_eq!(device.extinguisher_type_id, None);
        assert_eq!(device.serial_number, None);
        assert_eq!(device.manufacture_date, None);
        assert_eq!(device.description, None);
        assert_eq!(device.size, None);
        assert_eq!(device.status, None);
    }

    #[test]
    fn test_required_fields() {
        let mut input = valid_input();
        input.room_id.clear();
        input.device_type_id.clear();
        // Room is checked before device type
        assert_eq!(validate_device(&input, today()), Err(DeviceValidationError::RoomRequired));

        let mut input = valid_input();
        input.device_type_id.clear();
        assert_eq!(
            validate_device(&input, today()),
            Err(DeviceValidationError::DeviceTypeRequired)
        );
    }

    #[test]
    fn test_required_checks_precede_parsing() {
        let mut input = valid_input();
        input.room_id = "abc".to_string();
        input.device_type_id.clear();
        assert_eq!(
            validate_device(&input, today()),
            Err(DeviceValidationError::DeviceTypeRequired)
        );
    }

    #[test]
    fn test_non_integer_ids_are_rejected() {
        let mut input = valid_input();
        input.room_id = "A1".to_string();
        assert_eq!(validate_device(&input, today()), Err(DeviceValidationError::InvalidRoomID));

        let mut input = valid_input();
        input.device_type_id = "fire".to_string();
        assert_eq!(
            validate_device(&input, today()),
            Err(DeviceValidationError::InvalidDeviceTypeID)
        );

        let mut input = valid_input();
        input.extinguisher_type_id = "CO2".to_string();
        assert_eq!(
            validate_device(&input, today()),
            Err(DeviceValidationError::InvalidExtinguisherTypeID)
        );
    }

    #[test]
    fn test_manufacture_date_format() {
        for bad in ["15/06/2024", "2024-13-01", "2024-02-30", "yesterday"] {
            let mut input = valid_input();
            input.manufacture_date = bad.to_string();
            assert_eq!(
                validate_device(&input, today()),
                Err(DeviceValidationError::InvalidManufactureDate),
                "{} should not parse",
                bad
            );
        }
    }

    #[test]
    fn test_manufacture_date_today_accepted_tomorrow_rejected() {
        let mut input = valid_input();
        input.manufacture_date = "2024-06-15".to_string();
        assert!(validate_device(&input, today()).is_ok());

        input.manufacture_date = "2024-06-16".to_string();
        assert_eq!(
            validate_device(&input, today()),
            Err(DeviceValidationError::ManufactureDateInFuture)
        );
    }

    #[test]
    fn test_length_limits_accept_boundary() {
        let mut input = valid_input();
        input.serial_number = "S".repeat(MAX_SERIAL_NUMBER_LEN);
        input.description = "d".repeat(MAX_DESCRIPTION_LEN);
        input.size = "z".repeat(MAX_SIZE_LEN);
        input.status = "s".repeat(MAX_STATUS_LEN);
        assert!(validate_device(&input, today()).is_ok());
    }

    #[test]
    fn test_length_limits_count_characters() {
        let mut input = valid_input();
        input.description = "é".repeat(MAX_DESCRIPTION_LEN);
        assert!(input.description.len() > MAX_DESCRIPTION_LEN);
        assert!(validate_device(&input, today()).is_ok());

        input.description.push('é');
        assert_eq!(validate_device(&input, today()), Err(DeviceValidationError::DescriptionTooLong));
    }

    #[test]
    fn test_length_limits_reject_one_over() {
        let cases: [(fn(&mut DeviceInput), DeviceValidationError); 4] = [
            (
                |i| i.serial_number = "S".repeat(MAX_SERIAL_NUMBER_LEN + 1),
                DeviceValidationError::SerialNumberTooLong,
            ),
            (
                |i| i.description = "d".repeat(MAX_DESCRIPTION_LEN + 1),
                DeviceValidationError::DescriptionTooLong,
            ),
            (|i| i.size = "z".repeat(MAX_SIZE_LEN + 1), DeviceValidationError::SizeTooLong),
            (|i| i.status = "s".repeat(MAX_STATUS_LEN + 1), DeviceValidationError::StatusTooLong),
        ];

        for (mutate, expected) in cases {
            let mut input = valid_input();
            mutate(&mut input);
            assert_eq!(validate_device(&input, today()), Err(expected));
        }
    }

    #[test]
    fn test_error_messages_are_human_readable() {
        assert_eq!(DeviceValidationError::RoomRequired.to_string(), "room is required");
        assert_eq!(
            DeviceValidationError::ManufactureDateInFuture.to_string(),
            "manufacture date cannot be in the future"
        );
    }

    #[test]
    fn test_site_fields_are_trimmed() {
        let (name, address) =
            validate_site_fields("  EIT Taradale ", " 501 Gloucester Street ").expect("valid");
        assert_eq!(name, "EIT Taradale");
        assert_eq!(address, "501 Gloucester Street");
    }

    #[test]
    fn test_site_field_rules() {
        assert_eq!(validate_site_fields("  ", "addr"), Err(SiteValidationError::MissingFields));
        assert_eq!(validate_site_fields("Site", ""), Err(SiteValidationError::MissingFields));
        assert_eq!(
            validate_site_fields(&"n".repeat(101), "addr"),
            Err(SiteValidationError::TooLong)
        );
        assert_eq!(
            validate_site_fields("Site", &"a".repeat(256)),
            Err(SiteValidationError::TooLong)
        );
        assert_eq!(
            validate_site_fields("Site/../etc", "addr"),
            Err(SiteValidationError::InvalidName)
        );
        assert!(validate_site_fields("North_Campus-2", "addr").is_ok());
    }

    #[test]
    fn test_code_and_type_name_rules() {
        assert_eq!(validate_code("Building", " A "), Ok("A".to_string()));
        assert!(validate_code("Room", "").is_err());
        assert!(validate_code("Room", &"r".repeat(51)).is_err());
        assert_eq!(validate_device_type_name("Fire Blanket"), Ok("Fire Blanket".to_string()));
        assert!(validate_device_type_name(" ").is_err());
    }

    #[test]
    fn test_user_field_rules() {
        assert!(validate_user_fields("inspector_1", "i@example.com", "longenough", "user").is_ok());
        assert_eq!(
            validate_user_fields("ab", "i@example.com", "longenough", "user"),
            Err(UserValidationError::InvalidUsername)
        );
        assert_eq!(
            validate_user_fields("inspector", "not-an-email", "longenough", "user"),
            Err(UserValidationError::InvalidEmail)
        );
        assert_eq!(
            validate_user_fields("inspector", "i@example.com", "short", "user"),
            Err(UserValidationError::PasswordTooShort)
        );
        assert_eq!(
            validate_user_fields("inspector", "i@example.com", "longenough", "root"),
            Err(UserValidationError::InvalidRole)
        );
    }
}
