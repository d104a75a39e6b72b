//! The standard shape catalog.
//!
//! Every category of the standard sync plan resolves to one of these shapes.
//! Field names are the camelCase keys the central authority emits.

use crate::shape::{FieldSpec, FieldType, Shape};
use FieldType::{Boolean, Integer, Json, Text, Timestamp};

const fn req(name: &'static str, ty: FieldType) -> FieldSpec {
    FieldSpec::required(name, ty)
}

const fn opt(name: &'static str, ty: FieldType) -> FieldSpec {
    FieldSpec::optional(name, ty)
}

/// Machine types (desktop, laptop, kiosk).
pub static MACHINE_TYPE: Shape = Shape {
    name: "MachineType",
    fields: &[
        req("code", Text),
        req("langCode", Text),
        opt("name", Text),
        opt("description", Text),
        opt("isActive", Boolean),
    ],
    primary_key: &["code", "langCode"],
};

/// Machine specifications.
pub static REG_MACHINE_SPEC: Shape = Shape {
    name: "RegMachineSpec",
    fields: &[
        req("id", Text),
        req("langCode", Text),
        opt("name", Text),
        opt("brand", Text),
        opt("model", Text),
        opt("machineTypeCode", Text),
        opt("minDriverversion", Text),
        opt("description", Text),
        opt("isActive", Boolean),
    ],
    primary_key: &["id", "langCode"],
};

/// Registered machines.
pub static MACHINE_MASTER: Shape = Shape {
    name: "MachineMaster",
    fields: &[
        req("id", Text),
        opt("langCode", Text),
        opt("name", Text),
        opt("macAddress", Text),
        opt("serialNum", Text),
        opt("ipAddress", Text),
        opt("machineSpecId", Text),
        opt("regCenterId", Text),
        opt("publicKey", Text),
        opt("keyIndex", Text),
        opt("signPublicKey", Text),
        opt("signKeyIndex", Text),
        opt("zoneCode", Text),
        opt("validityDateTime", Timestamp),
        opt("isActive", Boolean),
    ],
    primary_key: &["id"],
};

/// Registration center types.
pub static REGISTRATION_CENTER_TYPE: Shape = Shape {
    name: "RegistrationCenterType",
    fields: &[
        req("code", Text),
        req("langCode", Text),
        opt("name", Text),
        opt("descr", Text),
        opt("isActive", Boolean),
    ],
    primary_key: &["code", "langCode"],
};

/// Registration centers, one row per language.
pub static REGISTRATION_CENTER: Shape = Shape {
    name: "RegistrationCenter",
    fields: &[
        req("id", Text),
        req("langCode", Text),
        opt("name", Text),
        opt("centerTypeCode", Text),
        opt("addressLine1", Text),
        opt("addressLine2", Text),
        opt("addressLine3", Text),
        opt("latitude", Text),
        opt("longitude", Text),
        opt("locationCode", Text),
        opt("contactPhone", Text),
        opt("contactPerson", Text),
        opt("numberOfKiosks", Integer),
        opt("workingHours", Text),
        opt("perKioskProcessTime", Text),
        opt("centerStartTime", Text),
        opt("centerEndTime", Text),
        opt("lunchStartTime", Text),
        opt("lunchEndTime", Text),
        opt("timeZone", Text),
        opt("holidayLocationCode", Text),
        opt("zoneCode", Text),
        opt("isActive", Boolean),
    ],
    primary_key: &["id", "langCode"],
};

/// Machine to center mapping.
pub static CENTER_MACHINE: Shape = Shape {
    name: "CenterMachine",
    fields: &[
        req("regCenterId", Text),
        req("machineId", Text),
        opt("langCode", Text),
        opt("isActive", Boolean),
    ],
    primary_key: &["regCenterId", "machineId"],
};

/// User to center mapping.
pub static REG_CENTER_USER: Shape = Shape {
    name: "RegCenterUser",
    fields: &[
        req("regCenterId", Text),
        req("userId", Text),
        opt("langCode", Text),
        opt("isActive", Boolean),
    ],
    primary_key: &["regCenterId", "userId"],
};

/// Role priorities per application process.
pub static APP_ROLE_PRIORITY: Shape = Shape {
    name: "AppRolePriority",
    fields: &[
        req("appId", Text),
        req("processId", Text),
        req("roleCode", Text),
        opt("priority", Integer),
        opt("langCode", Text),
        opt("isActive", Boolean),
    ],
    primary_key: &["appId", "processId", "roleCode"],
};

/// Authentication methods per application process and role.
pub static APP_AUTHENTICATION_METHOD: Shape = Shape {
    name: "AppAuthenticationMethod",
    fields: &[
        req("appId", Text),
        req("processId", Text),
        req("roleCode", Text),
        req("authMethodCode", Text),
        opt("methodSequence", Integer),
        opt("langCode", Text),
        opt("isActive", Boolean),
    ],
    primary_key: &["appId", "processId", "roleCode", "authMethodCode"],
};

/// Template file formats.
pub static TEMPLATE_FILE_FORMAT: Shape = Shape {
    name: "TemplateFileFormat",
    fields: &[
        req("code", Text),
        req("langCode", Text),
        opt("description", Text),
        opt("isActive", Boolean),
    ],
    primary_key: &["code", "langCode"],
};

/// Template types.
pub static TEMPLATE_TYPE: Shape = Shape {
    name: "TemplateType",
    fields: &[
        req("code", Text),
        req("langCode", Text),
        opt("description", Text),
        opt("isActive", Boolean),
    ],
    primary_key: &["code", "langCode"],
};

/// Notification and acknowledgement templates.
pub static TEMPLATE: Shape = Shape {
    name: "Template",
    fields: &[
        req("id", Text),
        req("langCode", Text),
        opt("name", Text),
        opt("description", Text),
        opt("fileFormatCode", Text),
        opt("model", Text),
        opt("fileText", Text),
        opt("moduleId", Text),
        opt("moduleName", Text),
        opt("templateTypeCode", Text),
        opt("isActive", Boolean),
    ],
    primary_key: &["id", "langCode"],
};

/// Document types.
pub static DOCUMENT_TYPE: Shape = Shape {
    name: "DocumentType",
    fields: &[
        req("code", Text),
        req("langCode", Text),
        opt("name", Text),
        opt("description", Text),
        opt("isActive", Boolean),
    ],
    primary_key: &["code", "langCode"],
};

/// Document categories.
pub static DOCUMENT_CATEGORY: Shape = Shape {
    name: "DocumentCategory",
    fields: &[
        req("code", Text),
        req("langCode", Text),
        opt("name", Text),
        opt("description", Text),
        opt("isActive", Boolean),
    ],
    primary_key: &["code", "langCode"],
};

/// Documents valid per applicant type.
pub static APPLICANT_VALID_DOCUMENT: Shape = Shape {
    name: "ApplicantValidDocument",
    fields: &[
        req("appTypeCode", Text),
        req("docTypeCode", Text),
        req("docCatCode", Text),
        opt("langCode", Text),
        opt("isActive", Boolean),
    ],
    primary_key: &["appTypeCode", "docTypeCode", "docCatCode"],
};

/// Document type to category mapping.
pub static VALID_DOCUMENT: Shape = Shape {
    name: "ValidDocument",
    fields: &[
        req("docTypeCode", Text),
        req("docCategoryCode", Text),
        opt("langCode", Text),
        opt("isActive", Boolean),
    ],
    primary_key: &["docTypeCode", "docCategoryCode"],
};

/// Biometric types (finger, iris, face).
pub static BIOMETRIC_TYPE: Shape = Shape {
    name: "BiometricType",
    fields: &[
        req("code", Text),
        req("langCode", Text),
        opt("name", Text),
        opt("description", Text),
        opt("isActive", Boolean),
    ],
    primary_key: &["code", "langCode"],
};

/// Biometric attributes of a biometric type.
pub static BIOMETRIC_ATTRIBUTE: Shape = Shape {
    name: "BiometricAttribute",
    fields: &[
        req("code", Text),
        req("langCode", Text),
        opt("name", Text),
        opt("description", Text),
        opt("biometricTypeCode", Text),
        opt("isActive", Boolean),
    ],
    primary_key: &["code", "langCode"],
};

/// Identity document types.
pub static ID_TYPE: Shape = Shape {
    name: "IdType",
    fields: &[
        req("code", Text),
        req("langCode", Text),
        opt("name", Text),
        opt("descr", Text),
        opt("isActive", Boolean),
    ],
    primary_key: &["code", "langCode"],
};

/// Location hierarchy nodes.
pub static LOCATION: Shape = Shape {
    name: "Location",
    fields: &[
        req("code", Text),
        req("langCode", Text),
        opt("name", Text),
        opt("hierarchyLevel", Integer),
        opt("hierarchyName", Text),
        opt("parentLocCode", Text),
        opt("isActive", Boolean),
    ],
    primary_key: &["code", "langCode"],
};

/// Location hierarchy level names.
pub static LOCATION_HIERARCHY: Shape = Shape {
    name: "LocationHierarchy",
    fields: &[
        req("hierarchyLevel", Integer),
        req("hierarchyLevelName", Text),
        req("langCode", Text),
        opt("isActive", Boolean),
    ],
    primary_key: &["hierarchyLevel", "hierarchyLevelName", "langCode"],
};

/// Words rejected in free-text input.
pub static BLACKLISTED_WORDS: Shape = Shape {
    name: "BlacklistedWords",
    fields: &[
        req("word", Text),
        req("langCode", Text),
        opt("description", Text),
        opt("isActive", Boolean),
    ],
    primary_key: &["word", "langCode"],
};

/// Registration processes, reached from the wire name `ProcessList`.
pub static REG_PROCESS_LIST: Shape = Shape {
    name: "RegProcessList",
    fields: &[
        req("id", Text),
        req("langCode", Text),
        opt("name", Text),
        opt("descr", Text),
        opt("isActive", Boolean),
    ],
    primary_key: &["id", "langCode"],
};

/// Client screens.
pub static SCREEN_DETAIL: Shape = Shape {
    name: "ScreenDetail",
    fields: &[
        req("id", Text),
        req("langCode", Text),
        opt("appId", Text),
        opt("name", Text),
        opt("descr", Text),
        opt("isActive", Boolean),
    ],
    primary_key: &["id", "langCode"],
};

/// Screen access per role.
pub static SCREEN_AUTHORIZATION: Shape = Shape {
    name: "ScreenAuthorization",
    fields: &[
        req("screenId", Text),
        req("roleCode", Text),
        opt("langCode", Text),
        opt("isPermitted", Boolean),
        opt("isActive", Boolean),
    ],
    primary_key: &["screenId", "roleCode"],
};

/// Supported languages.
pub static LANGUAGE: Shape = Shape {
    name: "Language",
    fields: &[
        req("code", Text),
        opt("name", Text),
        opt("family", Text),
        opt("nativeName", Text),
        opt("isActive", Boolean),
    ],
    primary_key: &["code"],
};

/// Reason categories for rejections and holds.
pub static REASON_CATEGORY: Shape = Shape {
    name: "ReasonCategory",
    fields: &[
        req("code", Text),
        req("langCode", Text),
        opt("name", Text),
        opt("description", Text),
        opt("isActive", Boolean),
    ],
    primary_key: &["code", "langCode"],
};

/// Reasons within a reason category.
pub static REASON_LIST: Shape = Shape {
    name: "ReasonList",
    fields: &[
        req("code", Text),
        req("rsnCatCode", Text),
        req("langCode", Text),
        opt("name", Text),
        opt("description", Text),
        opt("isActive", Boolean),
    ],
    primary_key: &["code", "rsnCatCode", "langCode"],
};

/// Scheduled job definitions.
pub static SYNC_JOB_DEF: Shape = Shape {
    name: "SyncJobDef",
    fields: &[
        req("id", Text),
        opt("name", Text),
        opt("apiName", Text),
        opt("parentSyncJobId", Text),
        opt("syncFreq", Text),
        opt("lockDuration", Text),
        opt("langCode", Text),
        opt("isActive", Boolean),
    ],
    primary_key: &["id"],
};

/// Configuration keys the client may override locally.
pub static PERMITTED_LOCAL_CONFIG: Shape = Shape {
    name: "PermittedLocalConfig",
    fields: &[
        req("code", Text),
        opt("name", Text),
        opt("type", Text),
        opt("isActive", Boolean),
    ],
    primary_key: &["code"],
};

/// Data-driven field definitions. Built from dynamic datasets only.
pub static DYNAMIC_FIELD: Shape = Shape {
    name: "DynamicField",
    fields: &[
        req("id", Text),
        opt("dataType", Text),
        opt("name", Text),
        opt("langCode", Text),
        req("valueJson", Json),
        req("isActive", Boolean),
    ],
    primary_key: &["id"],
};

/// Every shape of the standard catalog.
pub static STANDARD_SHAPES: [&Shape; 31] = [
    &MACHINE_TYPE,
    &REG_MACHINE_SPEC,
    &MACHINE_MASTER,
    &REGISTRATION_CENTER_TYPE,
    &REGISTRATION_CENTER,
    &CENTER_MACHINE,
    &REG_CENTER_USER,
    &APP_ROLE_PRIORITY,
    &APP_AUTHENTICATION_METHOD,
    &TEMPLATE_FILE_FORMAT,
    &TEMPLATE_TYPE,
    &TEMPLATE,
    &DOCUMENT_TYPE,
    &DOCUMENT_CATEGORY,
    &APPLICANT_VALID_DOCUMENT,
    &VALID_DOCUMENT,
    &BIOMETRIC_TYPE,
    &BIOMETRIC_ATTRIBUTE,
    &ID_TYPE,
    &LOCATION,
    &LOCATION_HIERARCHY,
    &BLACKLISTED_WORDS,
    &REG_PROCESS_LIST,
    &SCREEN_DETAIL,
    &SCREEN_AUTHORIZATION,
    &LANGUAGE,
    &REASON_CATEGORY,
    &REASON_LIST,
    &SYNC_JOB_DEF,
    &PERMITTED_LOCAL_CONFIG,
    &DYNAMIC_FIELD,
];

/// Historical wire names and the shape each one now maps to.
///
/// Device targets have no shape in this catalog; those aliases fall through
/// to the direct and `Reg` tiers when resolved.
pub static STANDARD_ALIASES: [(&str, &str); 15] = [
    ("Device", "RegDeviceMaster"),
    ("DeviceType", "RegDeviceType"),
    ("DeviceSpecification", "RegDeviceSpec"),
    ("MachineSpecification", "RegMachineSpec"),
    ("RegistrationCenterDevice", "RegCenterDevice"),
    ("RegistrationCenterUser", "RegCenterUser"),
    ("RegistrationCenterMachine", "CenterMachine"),
    ("RegistrationCenterMachineDevice", "RegCentreMachineDevice"),
    ("RegistrationDeviceMaster", "RegDeviceMaster"),
    ("DeviceService", "MosipDeviceService"),
    ("DeviceTypeDPM", "RegisteredDeviceType"),
    ("DeviceSubTypeDPM", "RegisteredSubDeviceType"),
    ("RegisteredDevice", "RegisteredDeviceMaster"),
    ("Machine", "MachineMaster"),
    ("RegistrationCenterUserMachine", "UserMachineMapping"),
];
