use std::collections::HashMap;
use std::ffi::{CString, c_char, c_void};

/// Property bag passed across the plugin boundary. Each key holds an array
/// of one value type; setting an index past the end grows the array with
/// zero values.
///
/// All getters fail on an absent key or an out of range index, they never
/// fabricate defaults.
#[derive(Default)]
pub struct PropertySet {
    pointers: HashMap<String, Vec<*mut c_void>>,
    strings: HashMap<String, Vec<String>>,
    doubles: HashMap<String, Vec<f64>>,
    ints: HashMap<String, Vec<i32>>,
    // Backing storage for the most recent string handed out over FFI.
    scratch: CString,
}

impl PropertySet {
    pub fn set_pointer(&mut self, key: &str, index: usize, value: *mut c_void) {
        let values = self.pointers.entry(key.to_string()).or_default();
        if values.len() <= index {
            values.resize(index + 1, std::ptr::null_mut());
        }
        values[index] = value;
    }

    pub fn set_string(&mut self, key: &str, index: usize, value: &str) {
        let values = self.strings.entry(key.to_string()).or_default();
        if values.len() <= index {
            values.resize(index + 1, String::new());
        }
        values[index] = value.to_string();
    }

    pub fn set_double(&mut self, key: &str, index: usize, value: f64) {
        let values = self.doubles.entry(key.to_string()).or_default();
        if values.len() <= index {
            values.resize(index + 1, 0.0);
        }
        values[index] = value;
    }

    pub fn set_int(&mut self, key: &str, index: usize, value: i32) {
        let values = self.ints.entry(key.to_string()).or_default();
        if values.len() <= index {
            values.resize(index + 1, 0);
        }
        values[index] = value;
    }

    pub fn pointer(&self, key: &str, index: usize) -> Option<*mut c_void> {
        self.pointers.get(key)?.get(index).copied()
    }

    pub fn string(&self, key: &str, index: usize) -> Option<&str> {
        Some(self.strings.get(key)?.get(index)?.as_str())
    }

    pub fn double(&self, key: &str, index: usize) -> Option<f64> {
        self.doubles.get(key)?.get(index).copied()
    }

    pub fn int(&self, key: &str, index: usize) -> Option<i32> {
        self.ints.get(key)?.get(index).copied()
    }

    /// C view of a string value. The pointer stays valid until the next
    /// call on this property set.
    pub fn string_ptr(&mut self, key: &str, index: usize) -> Option<*const c_char> {
        let value = self.strings.get(key)?.get(index)?;
        self.scratch = CString::new(value.as_str()).ok()?;
        Some(self.scratch.as_ptr())
    }

    /// Number of values stored under a key, in whichever typed map holds
    /// it first.
    pub fn dimension(&self, key: &str) -> Option<usize> {
        if let Some(values) = self.pointers.get(key) {
            return Some(values.len());
        }
        if let Some(values) = self.strings.get(key) {
            return Some(values.len());
        }
        if let Some(values) = self.doubles.get(key) {
            return Some(values.len());
        }
        self.ints.get(key).map(|values| values.len())
    }

    /// Remove a key from every typed map. Reports whether anything was
    /// removed.
    pub fn reset(&mut self, key: &str) -> bool {
        let mut removed = self.pointers.remove(key).is_some();
        removed |= self.strings.remove(key).is_some();
        removed |= self.doubles.remove(key).is_some();
        removed |= self.ints.remove(key).is_some();
        removed
    }
}
