// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Browser localStorage as a progress backend.

use leasecraft_core::error::ErrorReport;
use leasecraft_core::error::Fallible;
use leasecraft_core::progress::store::KeyValue;
use wasm_bindgen::JsValue;
use web_sys::Storage as WebStorage;

/// `window.localStorage`, if the page has one. Without it reads come back
/// empty and writes are dropped, so progress simply isn't kept.
pub struct LocalStorage {
    inner: Option<WebStorage>,
}

impl LocalStorage {
    pub fn new() -> Self {
        let inner = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();
        Self { inner }
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn js_error(op: &str, key: &str, value: JsValue) -> ErrorReport {
    ErrorReport::new(format!("localStorage {op} of '{key}' failed: {value:?}"))
}

impl KeyValue for LocalStorage {
    fn get(&self, key: &str) -> Fallible<Option<String>> {
        match &self.inner {
            Some(storage) => storage.get_item(key).map_err(|e| js_error("read", key, e)),
            None => Ok(None),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Fallible<()> {
        match &self.inner {
            Some(storage) => storage
                .set_item(key, value)
                .map_err(|e| js_error("write", key, e)),
            None => Ok(()),
        }
    }

    fn remove(&mut self, key: &str) -> Fallible<()> {
        match &self.inner {
            Some(storage) => storage
                .remove_item(key)
                .map_err(|e| js_error("removal", key, e)),
            None => Ok(()),
        }
    }
}
