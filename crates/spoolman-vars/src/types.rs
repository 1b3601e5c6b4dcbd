//! Spool data, tracked variables and host events.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{BridgeError, Result};
use crate::escape::escape;

/// Filament attributes of the active spool, as mirrored into Klipper.
///
/// Every field holds the display form of the value Spoolman returned, so
/// `210.0` stays `"210.0"` and strings are stored unquoted. Missing or
/// non-scalar fields are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedSpool {
    /// Filament id in Spoolman.
    pub id: Option<String>,
    pub hotend_temp: Option<String>,
    pub bed_temp: Option<String>,
    pub material: Option<String>,
    pub name: Option<String>,
    /// Display name of the filament vendor.
    pub vendor: Option<String>,
}

impl NormalizedSpool {
    /// Escaped value of `variable`, ready for a quoted G-code token.
    pub fn escaped(&self, variable: TrackedVariable) -> String {
        let value = match variable {
            TrackedVariable::Id => &self.id,
            TrackedVariable::HotendTemp => &self.hotend_temp,
            TrackedVariable::BedTemp => &self.bed_temp,
            TrackedVariable::Material => &self.material,
            TrackedVariable::Name => &self.name,
            TrackedVariable::Vendor => &self.vendor,
        };
        escape(value.as_deref())
    }

    /// Pick the six tracked fields out of a Spoolman filament object.
    pub(crate) fn from_filament(filament: &Map<String, Value>) -> Self {
        let field = |key: &str| filament.get(key).and_then(scalar_text);
        let vendor = filament
            .get("vendor")
            .and_then(Value::as_object)
            .and_then(|vendor| vendor.get("name"))
            .and_then(scalar_text);

        Self {
            id: field("id"),
            hotend_temp: field("settings_extruder_temp"),
            bed_temp: field("settings_bed_temp"),
            material: field("material"),
            name: field("name"),
            vendor,
        }
    }
}

/// Display form of a JSON scalar; `null`, arrays and objects have none.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// JSON values Spoolman uses to say "nothing here".
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// The `gcode_macro` variables kept in sync with the active spool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackedVariable {
    Id,
    HotendTemp,
    BedTemp,
    Material,
    Name,
    Vendor,
}

impl TrackedVariable {
    /// Write order for clear and update passes.
    pub const ALL: [TrackedVariable; 6] = [
        TrackedVariable::Id,
        TrackedVariable::HotendTemp,
        TrackedVariable::BedTemp,
        TrackedVariable::Material,
        TrackedVariable::Name,
        TrackedVariable::Vendor,
    ];

    /// Variable name as declared in the Klipper macro.
    pub fn as_str(self) -> &'static str {
        match self {
            TrackedVariable::Id => "id",
            TrackedVariable::HotendTemp => "hotend_temp",
            TrackedVariable::BedTemp => "bed_temp",
            TrackedVariable::Material => "material",
            TrackedVariable::Name => "name",
            TrackedVariable::Vendor => "vendor",
        }
    }
}

/// Events delivered by the host that drive synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// Klipper finished starting and accepts G-code.
    FirmwareReady,
    /// Spoolman's active spool changed; `None` means the selection was cleared.
    ActiveSpoolSet { spool_id: Option<i64> },
}

// ---------- Spoolman ----------

/// Response body of `GET /api/v1/spool/{id}`; only the filament is read.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SpoolResponse {
    #[serde(default)]
    pub filament: Option<Value>,
}

impl SpoolResponse {
    /// The filament object, or `None` when it is missing or empty.
    ///
    /// Any other non-object filament is reported as [`BridgeError::UnexpectedPayload`].
    pub(crate) fn filament_record(self) -> Result<Option<Map<String, Value>>> {
        match self.filament {
            None => Ok(None),
            Some(value) if is_empty_value(&value) => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(other) => Err(BridgeError::UnexpectedPayload(format!(
                "filament is not an object: {other}"
            ))),
        }
    }
}

// ---------- Moonraker ----------

/// Response of `GET /server/spoolman/spool_id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct SpoolIdEnvelope {
    #[serde(default)]
    pub result: Option<SpoolIdResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct SpoolIdResult {
    #[serde(default)]
    pub spool_id: Option<i64>,
}

/// Response of `GET /server/info`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ServerInfoEnvelope {
    pub result: ServerInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ServerInfo {
    #[serde(default)]
    pub klippy_state: Option<String>,
}

/// Error payload returned by Moonraker on failed requests.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MoonrakerErrorBody {
    pub error: MoonrakerErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MoonrakerErrorDetail {
    pub message: String,
}
