use chrono::{NaiveDate, NaiveDateTime};
use diesel::{Associations, Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::inspections;

/// A dated checklist examination of a device. Inspections are immutable
/// once recorded.
#[derive(
    Queryable, Selectable, Identifiable, Associations, Debug, Clone, Serialize, Deserialize, TS,
)]
#[diesel(belongs_to(crate::models::device::Device))]
#[diesel(belongs_to(crate::models::user::User))]
#[diesel(table_name = inspections)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct Inspection {
    pub id: i32,
    pub device_id: i32,
    pub user_id: i32,
    #[ts(type = "string")]
    pub inspection_date: NaiveDate,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
    pub is_conspicuous: Option<bool>,
    pub is_accessible: Option<bool>,
    pub is_assigned_location: Option<bool>,
    pub is_sign_visible: Option<bool>,
    pub is_anti_tamper_device_intact: Option<bool>,
    pub is_support_bracket_secure: Option<bool>,
    pub are_operating_instructions_clear: Option<bool>,
    pub is_maintenance_tag_attached: Option<bool>,
    pub is_no_external_damage: Option<bool>,
    pub is_replaced: Option<bool>,
    pub are_maintenance_records_complete: Option<bool>,
    pub work_order_required: Option<bool>,
    pub outcome: String,
    pub notes: Option<String>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = inspections)]
pub struct NewInspection {
    pub device_id: i32,
    pub user_id: i32,
    pub inspection_date: NaiveDate,
    pub created_at: NaiveDateTime,
    pub is_conspicuous: Option<bool>,
    pub is_accessible: Option<bool>,
    pub is_assigned_location: Option<bool>,
    pub is_sign_visible: Option<bool>,
    pub is_anti_tamper_device_intact: Option<bool>,
    pub is_support_bracket_secure: Option<bool>,
    pub are_operating_instructions_clear: Option<bool>,
    pub is_maintenance_tag_attached: Option<bool>,
    pub is_no_external_damage: Option<bool>,
    pub is_replaced: Option<bool>,
    pub are_maintenance_records_complete: Option<bool>,
    pub work_order_required: Option<bool>,
    pub outcome: String,
    pub notes: Option<String>,
}

/// Checklist answers. Unanswered items stay `None`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, TS)]
#[ts(export)]
pub struct InspectionChecklist {
    #[serde(default)]
    pub is_conspicuous: Option<bool>,
    #[serde(default)]
    pub is_accessible: Option<bool>,
    #[serde(default)]
    pub is_assigned_location: Option<bool>,
    #[serde(default)]
    pub is_sign_visible: Option<bool>,
    #[serde(default)]
    pub is_anti_tamper_device_intact: Option<bool>,
    #[serde(default)]
    pub is_support_bracket_secure: Option<bool>,
    #[serde(default)]
    pub are_operating_instructions_clear: Option<bool>,
    #[serde(default)]
    pub is_maintenance_tag_attached: Option<bool>,
    #[serde(default)]
    pub is_no_external_damage: Option<bool>,
    #[serde(default)]
    pub is_replaced: Option<bool>,
    #[serde(default)]
    pub are_maintenance_records_complete: Option<bool>,
    #[serde(default)]
    pub work_order_required: Option<bool>,
}

impl InspectionChecklist {
    /// A clean pass: every check answered `true` and no work order raised.
    pub fn all_passed() -> Self {
        InspectionChecklist {
            is_conspicuous: Some(true),
            is_accessible: Some(true),
            is_assigned_location: Some(true),
            is_sign_visible: Some(true),
            is_anti_tamper_device_intact: Some(true),
            is_support_bracket_secure: Some(true),
            are_operating_instructions_clear: Some(true),
            is_maintenance_tag_attached: Some(true),
            is_no_external_damage: Some(true),
            is_replaced: Some(true),
            are_maintenance_records_complete: Some(true),
            work_order_required: Some(false),
        }
    }
}

impl NewInspection {
    pub fn new(
        device_id: i32,
        user_id: i32,
        inspection_date: NaiveDate,
        checklist: InspectionChecklist,
        outcome: String,
        notes: Option<String>,
    ) -> Self {
        NewInspection {
            device_id,
            user_id,
            inspection_date,
            created_at: chrono::Utc::now().naive_utc(),
            is_conspicuous: checklist.is_conspicuous,
            is_accessible: checklist.is_accessible,
            is_assigned_location: checklist.is_assigned_location,
            is_sign_visible: checklist.is_sign_visible,
            is_anti_tamper_device_intact: checklist.is_anti_tamper_device_intact,
            is_support_bracket_secure: checklist.is_support_bracket_secure,
            are_operating_instructions_clear: checklist.are_operating_instructions_clear,
            is_maintenance_tag_attached: checklist.is_maintenance_tag_attached,
            is_no_external_damage: checklist.is_no_external_damage,
            is_replaced: checklist.is_replaced,
            are_maintenance_records_complete: checklist.are_maintenance_records_complete,
            work_order_required: checklist.work_order_required,
            outcome,
            notes,
        }
    }
}
