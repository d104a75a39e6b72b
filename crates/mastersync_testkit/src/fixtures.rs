//! Test fixtures: keys, sealed payloads, sample records and batches.

use mastersync_codec::{seal_payload, AesGcmCrypto, EncryptionKey};
use mastersync_protocol::{CategoryDataset, SyncBatch};
use mastersync_storage::{StoreDir, StoreSet};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Key material shared by every fixture.
pub const TEST_KEY: [u8; 32] = [0x5a; 32];

/// The fixture encryption key.
pub fn test_key() -> EncryptionKey {
    EncryptionKey::from_bytes(&TEST_KEY).expect("fixture key has the right size")
}

/// A cipher over [`TEST_KEY`].
pub fn test_cipher() -> Arc<AesGcmCrypto> {
    Arc::new(AesGcmCrypto::new(test_key()))
}

/// Seals records into a payload.
pub fn seal(cipher: &AesGcmCrypto, records: &[Value]) -> String {
    seal_payload(cipher, records).expect("fixture records seal")
}

/// Two records for a standard wire category, valid for its shape.
///
/// Unknown categories get a generic `code`/`langCode` record.
pub fn sample_records(category: &str) -> Vec<Value> {
    match category {
        "MachineType" => vec![
            json!({"code": "DKS", "langCode": "eng", "name": "Desktop", "isActive": true}),
            json!({"code": "LPT", "langCode": "eng", "name": "Laptop", "isActive": true}),
        ],
        "MachineSpecification" => vec![
            json!({"id": "1001", "langCode": "eng", "name": "Dell", "machineTypeCode": "DKS"}),
            json!({"id": "1002", "langCode": "eng", "name": "HP", "machineTypeCode": "LPT"}),
        ],
        "Machine" => vec![
            json!({
                "id": "10001", "langCode": "eng", "name": "reg-client-01",
                "macAddress": "A4-BB-6D-0F-B4-D0", "serialNum": "SN-01",
                "machineSpecId": "1001", "regCenterId": "10001",
                "validityDateTime": "2030-12-31T00:00:00.000Z", "isActive": true
            }),
            json!({"id": "10002", "name": "reg-client-02", "isActive": false}),
        ],
        "RegistrationCenterType" => vec![
            json!({"code": "REG", "langCode": "eng", "name": "Regular"}),
            json!({"code": "REG", "langCode": "fra", "name": "Régulier"}),
        ],
        "RegistrationCenter" => vec![
            json!({
                "id": "10001", "langCode": "eng", "name": "Center A",
                "centerTypeCode": "REG", "latitude": "34.52", "longitude": "-6.45",
                "numberOfKiosks": 3, "workingHours": "8:00:00", "isActive": true
            }),
            json!({"id": "10001", "langCode": "fra", "name": "Centre A", "numberOfKiosks": "3"}),
        ],
        "RegistrationCenterMachine" => vec![
            json!({"regCenterId": "10001", "machineId": "10001", "isActive": true}),
            json!({"regCenterId": "10001", "machineId": "10002", "isActive": true}),
        ],
        "RegistrationCenterUser" => vec![
            json!({"regCenterId": "10001", "userId": "operator1", "isActive": true}),
            json!({"regCenterId": "10001", "userId": "supervisor1", "isActive": true}),
        ],
        "AppRolePriority" => vec![
            json!({"appId": "reg", "processId": "login", "roleCode": "REG_ADMIN", "priority": 1}),
            json!({"appId": "reg", "processId": "login", "roleCode": "REG_OFFICER", "priority": 2}),
        ],
        "AppAuthenticationMethod" => vec![
            json!({
                "appId": "reg", "processId": "login", "roleCode": "REG_OFFICER",
                "authMethodCode": "PWD", "methodSequence": 1
            }),
            json!({
                "appId": "reg", "processId": "login", "roleCode": "REG_OFFICER",
                "authMethodCode": "FINGERPRINT", "methodSequence": 2
            }),
        ],
        "TemplateFileFormat" => vec![
            json!({"code": "html", "langCode": "eng", "description": "HTML"}),
            json!({"code": "txt", "langCode": "eng", "description": "Text"}),
        ],
        "TemplateType" => vec![
            json!({"code": "reg-ack", "langCode": "eng", "description": "Acknowledgement"}),
            json!({"code": "reg-preview", "langCode": "eng", "description": "Preview"}),
        ],
        "Template" => vec![
            json!({
                "id": "T1", "langCode": "eng", "name": "Ack", "fileFormatCode": "html",
                "fileText": "<html>$name</html>", "templateTypeCode": "reg-ack"
            }),
            json!({"id": "T2", "langCode": "eng", "name": "Preview", "templateTypeCode": "reg-preview"}),
        ],
        "DocumentType" => vec![
            json!({"code": "CIN", "langCode": "eng", "name": "National ID"}),
            json!({"code": "PSP", "langCode": "eng", "name": "Passport"}),
        ],
        "DocumentCategory" => vec![
            json!({"code": "POI", "langCode": "eng", "name": "Proof of Identity"}),
            json!({"code": "POA", "langCode": "eng", "name": "Proof of Address"}),
        ],
        "ApplicantValidDocument" => vec![
            json!({"appTypeCode": "001", "docTypeCode": "CIN", "docCatCode": "POI"}),
            json!({"appTypeCode": "001", "docTypeCode": "PSP", "docCatCode": "POI"}),
        ],
        "ValidDocument" => vec![
            json!({"docTypeCode": "CIN", "docCategoryCode": "POI", "isActive": true}),
            json!({"docTypeCode": "PSP", "docCategoryCode": "POI", "isActive": true}),
        ],
        "BiometricType" => vec![
            json!({"code": "FNR", "langCode": "eng", "name": "Fingerprint"}),
            json!({"code": "IRS", "langCode": "eng", "name": "Iris"}),
        ],
        "BiometricAttribute" => vec![
            json!({"code": "LF_INDEX", "langCode": "eng", "biometricTypeCode": "FNR"}),
            json!({"code": "L_IRIS", "langCode": "eng", "biometricTypeCode": "IRS"}),
        ],
        "IdType" => vec![
            json!({"code": "UIN", "langCode": "eng", "name": "UIN"}),
            json!({"code": "RID", "langCode": "eng", "name": "RID"}),
        ],
        "Location" => vec![
            json!({"code": "MOR", "langCode": "eng", "name": "Morocco", "hierarchyLevel": 0}),
            json!({
                "code": "RSK", "langCode": "eng", "name": "Rabat Sale Kenitra",
                "hierarchyLevel": "1", "parentLocCode": "MOR"
            }),
        ],
        "LocationHierarchy" => vec![
            json!({"hierarchyLevel": 0, "hierarchyLevelName": "Country", "langCode": "eng"}),
            json!({"hierarchyLevel": 1, "hierarchyLevelName": "Region", "langCode": "eng"}),
        ],
        "BlacklistedWords" => vec![
            json!({"word": "damn", "langCode": "eng"}),
            json!({"word": "merde", "langCode": "fra"}),
        ],
        "ProcessList" => vec![
            json!({"id": "NEW", "langCode": "eng", "name": "New Registration"}),
            json!({"id": "UPDATE", "langCode": "eng", "name": "Update UIN"}),
        ],
        "ScreenDetail" => vec![
            json!({"id": "login", "langCode": "eng", "appId": "reg", "name": "Login"}),
            json!({"id": "home", "langCode": "eng", "appId": "reg", "name": "Home"}),
        ],
        "ScreenAuthorization" => vec![
            json!({"screenId": "login", "roleCode": "REG_OFFICER", "isPermitted": true}),
            json!({"screenId": "home", "roleCode": "REG_OFFICER", "isPermitted": "true"}),
        ],
        "Language" => vec![
            json!({"code": "eng", "name": "English", "isActive": true}),
            json!({"code": "fra", "name": "French", "nativeName": "Français", "isActive": true}),
        ],
        "ReasonCategory" => vec![
            json!({"code": "CLR", "langCode": "eng", "name": "Client Rejection"}),
            json!({"code": "MNA", "langCode": "eng", "name": "Manual Adjudication"}),
        ],
        "ReasonList" => vec![
            json!({"code": "BPQ", "rsnCatCode": "CLR", "langCode": "eng", "name": "Bad photo"}),
            json!({"code": "DOC", "rsnCatCode": "CLR", "langCode": "eng", "name": "Bad document"}),
        ],
        "SyncJobDef" => vec![
            json!({"id": "MDS_J00001", "name": "Master Data Sync", "apiName": "masterSyncJob", "syncFreq": "0 0 11 * * ?"}),
            json!({"id": "PVS_J00002", "name": "Packet Status", "apiName": "packetSyncStatusJob"}),
        ],
        "PermittedLocalConfig" => vec![
            json!({"code": "mosip.registration.audit_log_deletion_configured_days", "name": "audit", "type": "CONFIGURATION"}),
            json!({"code": "mosip.registration.language", "name": "language", "type": "CONFIGURATION"}),
        ],
        _ => vec![
            json!({"id": "1", "code": "1", "langCode": "eng", "name": "first"}),
            json!({"id": "2", "code": "2", "langCode": "eng", "name": "second"}),
        ],
    }
}

/// Dynamic field records for one field name, one per language.
pub fn dynamic_records(name: &str, langs: &[&str]) -> Vec<Value> {
    langs
        .iter()
        .map(|lang| {
            json!({
                "id": format!("{name}-{lang}"),
                "name": name,
                "langCode": lang,
                "dataType": "string",
                "fieldVal": [{"code": "C1", "value": format!("{name} {lang}")}],
                "isActive": true
            })
        })
        .collect()
}

/// An identity schema document with two process specs.
pub fn schema_document(id_version: f64) -> Value {
    json!({
        "id": "schema-fixture",
        "idVersion": id_version,
        "schema": [
            {"id": "fullName", "type": "simpleType", "required": true},
            {"id": "dateOfBirth", "type": "string", "required": true}
        ],
        "schemaJson": "{\"type\":\"object\"}",
        "effectiveFrom": "2024-01-01T00:00:00.000Z",
        "newProcess": {
            "id": "NEW", "order": 1, "flow": "NEW", "isActive": true,
            "label": {"eng": "New Registration"},
            "screens": [{"name": "DemographicDetails", "order": 1}]
        },
        "updateProcess": {
            "id": "UPDATE", "order": 2, "flow": "UPDATE", "isActive": true,
            "label": {"eng": "Update UIN"},
            "screens": []
        }
    })
}

/// Builds sync batches with sealed payloads.
pub struct BatchBuilder {
    cipher: Arc<AesGcmCrypto>,
    batch: SyncBatch,
}

impl BatchBuilder {
    /// Starts an empty batch sealed with [`test_cipher`].
    pub fn new() -> Self {
        Self::with_cipher(test_cipher())
    }

    /// Starts an empty batch sealed with another cipher.
    pub fn with_cipher(cipher: Arc<AesGcmCrypto>) -> Self {
        Self {
            cipher,
            batch: SyncBatch::default(),
        }
    }

    /// Adds a fixed dataset.
    pub fn fixed(mut self, category: &str, records: &[Value]) -> Self {
        let payload = seal(&self.cipher, records);
        self.batch
            .push(CategoryDataset::fixed(category, Some(payload)));
        self
    }

    /// Adds a fixed dataset with its [`sample_records`].
    pub fn sample(self, category: &str) -> Self {
        let records = sample_records(category);
        self.fixed(category, &records)
    }

    /// Adds a fixed dataset with a raw, possibly invalid, payload.
    pub fn fixed_raw(mut self, category: &str, payload: Option<&str>) -> Self {
        self.batch
            .push(CategoryDataset::fixed(category, payload.map(str::to_string)));
        self
    }

    /// Adds a dynamic dataset.
    pub fn dynamic(mut self, name: &str, records: &[Value]) -> Self {
        let payload = seal(&self.cipher, records);
        self.batch
            .push(CategoryDataset::dynamic(name, Some(payload)));
        self
    }

    /// Sets `lastSyncTime`.
    pub fn last_sync_time(mut self, time: &str) -> Self {
        self.batch.last_sync_time = Some(time.to_string());
        self
    }

    /// Finishes the batch.
    pub fn build(self) -> SyncBatch {
        self.batch
    }
}

impl Default for BatchBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A batch with sample records for every category plus two dynamic fields.
pub fn full_batch<'a>(categories: impl IntoIterator<Item = &'a str>) -> SyncBatch {
    categories
        .into_iter()
        .fold(BatchBuilder::new(), BatchBuilder::sample)
        .dynamic("gender", &dynamic_records("gender", &["eng", "fra"]))
        .dynamic("bloodType", &dynamic_records("bloodType", &["eng"]))
        .last_sync_time("2024-03-01T10:30:00.000Z")
        .build()
}

/// A store directory in a temporary location, removed on drop.
pub struct TempStoreDir {
    dir: Arc<StoreDir>,
    _temp: TempDir,
}

impl TempStoreDir {
    /// Creates and locks a fresh store directory.
    pub fn new() -> Self {
        let temp = TempDir::new().expect("temp dir");
        let dir = StoreDir::open(temp.path(), true).expect("store dir opens");
        Self {
            dir: Arc::new(dir),
            _temp: temp,
        }
    }

    /// The shared store directory.
    pub fn dir(&self) -> Arc<StoreDir> {
        Arc::clone(&self.dir)
    }

    /// Path of the directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// A file-backed store set over the given categories.
    pub fn store_set<'a>(&self, categories: impl IntoIterator<Item = &'a str>) -> StoreSet {
        StoreSet::open_dir(self.dir(), categories).expect("file stores open")
    }
}

impl Default for TempStoreDir {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mastersync_codec::PayloadCodec;

    #[test]
    fn builder_seals_decodable_payloads() {
        let batch = BatchBuilder::new()
            .sample("Language")
            .fixed_raw("Machine", None)
            .dynamic("gender", &dynamic_records("gender", &["eng"]))
            .build();

        assert_eq!(batch.entries.len(), 3);
        let codec = PayloadCodec::new(test_cipher());
        let records = codec
            .decode(batch.entries[0].encrypted_payload.as_deref())
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(batch.dynamic_datasets().count(), 1);
    }

    #[test]
    fn temp_store_dir_sets() {
        let temp = TempStoreDir::new();
        let set = temp.store_set(["Language"]);
        assert_eq!(set.categories(), vec!["Language"]);
        assert!(temp.path().join("LOCK").exists());
    }
}
