//! WASM bindings for bank statement recovery.
//!
//! The page owns PDF rendering; it hands positioned text fragments (or
//! assembled text) to these bindings and gets ledgers back as plain objects.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use bankflow_core::{
    Category, InstitutionId, ParseResult, ParserRegistry, PositionedFragment, StatementDocument,
    StatementPipeline, Transaction, TransactionStore,
};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn from_js<T: serde::de::DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Parse assembled statement text.
///
/// `institution` is a registry key such as `"icbc"`; when absent or unknown
/// the institution is detected from the text.
#[wasm_bindgen]
pub fn parse_statement_text(text: &str, institution: Option<String>) -> Result<JsValue, JsValue> {
    let known = institution.map(InstitutionId::new);
    let result = StatementPipeline::default()
        .process_text(None, text, known.as_ref())
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_js(&result)
}

/// Reconstruct and parse a rendered document.
///
/// `pages` is an array of pages, each an array of `{text, x, y}` fragments.
#[wasm_bindgen]
pub fn parse_document(name: &str, pages: JsValue) -> Result<JsValue, JsValue> {
    let pages: Vec<Vec<PositionedFragment>> = from_js(pages)?;
    let document = StatementDocument {
        name: name.to_string(),
        pages,
    };
    let result = StatementPipeline::default()
        .process(&document)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_js(&result)
}

/// Detect the institution key of first-page text.
#[wasm_bindgen]
pub fn detect_institution(text: &str) -> Option<String> {
    ParserRegistry::default()
        .detect_institution(text)
        .map(|id| id.to_string())
}

/// Supported institutions as `{id, name}` objects.
#[wasm_bindgen]
pub fn supported_institutions() -> js_sys::Array {
    ParserRegistry::default()
        .profiles()
        .iter()
        .map(|p| {
            let entry = js_sys::Object::new();
            // Setting string keys on a fresh object cannot fail.
            let _ = js_sys::Reflect::set(&entry, &"id".into(), &p.id.as_str().into());
            let _ = js_sys::Reflect::set(&entry, &"name".into(), &p.name.into());
            JsValue::from(entry)
        })
        .collect()
}

/// Merged ledger across documents, for browser use.
#[wasm_bindgen]
pub struct Ledger {
    store: TransactionStore,
}

#[wasm_bindgen]
impl Ledger {
    /// Create an empty ledger.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            store: TransactionStore::default(),
        }
    }

    /// Replace the ledger with a parse result.
    #[wasm_bindgen]
    pub fn load(&mut self, result: JsValue) -> Result<(), JsValue> {
        let result: ParseResult = from_js(result)?;
        self.store.load_parse_result(result);
        Ok(())
    }

    /// Merge transactions, returning how many were new.
    #[wasm_bindgen]
    pub fn append(&mut self, transactions: JsValue) -> Result<usize, JsValue> {
        let transactions: Vec<Transaction> = from_js(transactions)?;
        Ok(self.store.append_transactions(transactions))
    }

    /// Remove everything read from one document.
    #[wasm_bindgen]
    pub fn remove_file(&mut self, source_file: &str) -> usize {
        self.store.remove_transactions_by_file(source_file)
    }

    /// Set a transaction's category by key, e.g. `"dining"`.
    #[wasm_bindgen]
    pub fn set_category(&mut self, id: &str, category: &str) -> Result<bool, JsValue> {
        let category = Category::from_id(category)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown category: {}", category)))?;
        Ok(self.store.update_transaction_category(id, category))
    }

    /// Set or clear a transaction's note.
    #[wasm_bindgen]
    pub fn set_note(&mut self, id: &str, note: Option<String>) -> bool {
        self.store.update_transaction_note(id, note)
    }

    #[wasm_bindgen]
    pub fn transactions(&self) -> Result<JsValue, JsValue> {
        to_js(self.store.transactions())
    }

    #[wasm_bindgen]
    pub fn summary(&self) -> Result<JsValue, JsValue> {
        to_js(&self.store.summary())
    }

    /// Institution and account of the loaded statement, or null.
    #[wasm_bindgen]
    pub fn parse_info(&self) -> Result<JsValue, JsValue> {
        to_js(&self.store.parse_info())
    }

    /// The held transactions as a JSON string, for download.
    #[wasm_bindgen]
    pub fn export_json(&self) -> Result<String, JsValue> {
        serde_json::to_string_pretty(self.store.transactions())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(getter)]
    pub fn length(&self) -> usize {
        self.store.len()
    }

    #[wasm_bindgen]
    pub fn clear(&mut self) {
        self.store.clear();
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
