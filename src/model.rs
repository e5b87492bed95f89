// mistclone - clone WLAN configurations through the Mist cloud API
// Copyright (C) 2024 Mathias Uhl <mathiasuhl@gmx.de>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Typed views of the Mist resources this tool reads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An organization site. Only the fields the prompts need are kept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Site {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// A WLAN configuration.
///
/// Everything besides `id` and `ssid` is carried in `extra` so that
/// serializing a `Wlan` gives back the object it was read from, explicit
/// nulls included.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Wlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub ssid: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Wlan {
    /// `vlan_id` is a number, or a string for variable VLANs.
    pub fn vlan_label(&self) -> String {
        match self.extra.get("vlan_id") {
            None | Some(Value::Null) => "N/A".to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

pub fn sort_sites(sites: &mut [Site]) {
    sites.sort_by(|a, b| a.name.cmp(&b.name));
}

pub fn sort_wlans(wlans: &mut [Wlan]) {
    wlans.sort_by(|a, b| a.ssid.cmp(&b.ssid));
}

/// Turns a source WLAN object into the payload for a new WLAN: the `id` is
/// dropped so the server assigns one, and `ssid` is replaced. The source
/// value is left untouched.
pub fn clone_payload(source: &Value, new_ssid: &str) -> Value {
    let mut payload = source.clone();
    if let Some(obj) = payload.as_object_mut() {
        obj.remove("id");
        obj.insert("ssid".to_string(), Value::String(new_ssid.to_string()));
    }
    payload
}
