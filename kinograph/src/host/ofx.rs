//! C ABI of the plugin boundary. Everything unsafe about talking to
//! plugins lives here: the property suite handed to render functions, the
//! raw image layout, and the symbols a plugin library exports.
//!
//! Render function pointers obtained from a library stay valid only while
//! the [`ImageEffectHost`](crate::host::effect_host::ImageEffectHost) that
//! loaded the library is alive.

use std::ffi::{CStr, c_char, c_int, c_void};

use libloading::{Library, Symbol};

use crate::error::KinographError;
use crate::host::property_set::PropertySet;
use crate::loader::image::Image;

pub type OfxStatus = c_int;

pub const OFX_STATUS_OK: OfxStatus = 0;
pub const OFX_STATUS_FAILED: OfxStatus = 1;
pub const OFX_STATUS_ERR_BAD_HANDLE: OfxStatus = 9;
pub const OFX_STATUS_ERR_BAD_INDEX: OfxStatus = 10;

/// Opaque handle to a [`PropertySet`] owned by the host.
pub type OfxPropertySetHandle = *mut c_void;

// Property keys, as Rust strings for the host side and as C strings for
// plugin code. The pairs must stay in sync.
pub const PROP_TIME: &str = "OfxPropTime";
pub const PROP_TIME_C: &CStr = c"OfxPropTime";
pub const PROP_SOURCE_IMAGE: &str = "kinograph:SourceImage";
pub const PROP_SOURCE_IMAGE_C: &CStr = c"kinograph:SourceImage";
pub const PROP_OUTPUT_IMAGE: &str = "kinograph:OutputImage";
pub const PROP_OUTPUT_IMAGE_C: &CStr = c"kinograph:OutputImage";

/// Pixel buffer shared with a plugin, RGBA with 8 bits per channel. The
/// host owns the memory on both sides of a render call.
#[repr(C)]
pub struct RawImage {
    pub width: u32,
    pub height: u32,
    pub data: *mut u8,
}

impl RawImage {
    pub fn from_image(image: &mut Image) -> RawImage {
        RawImage {
            width: image.width,
            height: image.height,
            data: image.data.as_mut_ptr(),
        }
    }
}

pub type RenderFn = unsafe extern "C" fn(
    *const PropertySuite,
    OfxPropertySetHandle,
    OfxPropertySetHandle,
) -> OfxStatus;

/// Descriptor a plugin library exposes for each of its effects.
#[repr(C)]
pub struct PluginDescriptor {
    pub name: *const c_char,
    pub version: c_int,
    pub render: RenderFn,
}

// Descriptors only point at static data inside the plugin library.
unsafe impl Sync for PluginDescriptor {}

pub type PluginCountFn = unsafe extern "C" fn() -> c_int;
pub type PluginAtFn = unsafe extern "C" fn(c_int) -> *const PluginDescriptor;

pub const PLUGIN_COUNT_SYMBOL: &[u8] = b"kinograph_plugin_count";
pub const PLUGIN_AT_SYMBOL: &[u8] = b"kinograph_plugin_at";

/// Function table plugins use to talk back to the host's property sets.
///
/// Status contract: a null property set handle or a null out pointer
/// reports [`OFX_STATUS_ERR_BAD_HANDLE`], a negative index
/// [`OFX_STATUS_ERR_BAD_INDEX`], and a value that is not present
/// [`OFX_STATUS_FAILED`]. Getters never fabricate defaults.
#[repr(C)]
pub struct PropertySuite {
    pub prop_set_pointer:
        unsafe extern "C" fn(OfxPropertySetHandle, *const c_char, c_int, *mut c_void) -> OfxStatus,
    pub prop_set_string:
        unsafe extern "C" fn(OfxPropertySetHandle, *const c_char, c_int, *const c_char) -> OfxStatus,
    pub prop_set_double:
        unsafe extern "C" fn(OfxPropertySetHandle, *const c_char, c_int, f64) -> OfxStatus,
    pub prop_set_int:
        unsafe extern "C" fn(OfxPropertySetHandle, *const c_char, c_int, c_int) -> OfxStatus,
    pub prop_get_pointer: unsafe extern "C" fn(
        OfxPropertySetHandle,
        *const c_char,
        c_int,
        *mut *mut c_void,
    ) -> OfxStatus,
    pub prop_get_string: unsafe extern "C" fn(
        OfxPropertySetHandle,
        *const c_char,
        c_int,
        *mut *const c_char,
    ) -> OfxStatus,
    pub prop_get_double:
        unsafe extern "C" fn(OfxPropertySetHandle, *const c_char, c_int, *mut f64) -> OfxStatus,
    pub prop_get_int:
        unsafe extern "C" fn(OfxPropertySetHandle, *const c_char, c_int, *mut c_int) -> OfxStatus,
    pub prop_get_dimension:
        unsafe extern "C" fn(OfxPropertySetHandle, *const c_char, *mut c_int) -> OfxStatus,
    pub prop_reset: unsafe extern "C" fn(OfxPropertySetHandle, *const c_char) -> OfxStatus,
}

pub static PROPERTY_SUITE: PropertySuite = PropertySuite {
    prop_set_pointer,
    prop_set_string,
    prop_set_double,
    prop_set_int,
    prop_get_pointer,
    prop_get_string,
    prop_get_double,
    prop_get_int,
    prop_get_dimension,
    prop_reset,
};

pub fn property_set_handle(set: &mut PropertySet) -> OfxPropertySetHandle {
    set as *mut PropertySet as OfxPropertySetHandle
}

/// Invoke a plugin render function with the host's suite and the two
/// argument sets.
pub fn call_render(
    render: RenderFn,
    in_args: &mut PropertySet,
    out_args: &mut PropertySet,
) -> OfxStatus {
    let in_handle = property_set_handle(in_args);
    let out_handle = property_set_handle(out_args);
    unsafe { render(&PROPERTY_SUITE, in_handle, out_handle) }
}

/// An effect found in a plugin library.
pub struct LoadedEffect {
    pub name: String,
    pub version: i32,
    pub render: RenderFn,
}

pub fn open_library(path: &std::path::Path) -> Result<Library, KinographError> {
    Ok(unsafe { Library::new(path) }?)
}

/// Enumerate the effects a plugin library exports. Descriptors with a null
/// or non UTF-8 name are skipped.
pub fn load_effects(library: &Library) -> Result<Vec<LoadedEffect>, KinographError> {
    unsafe {
        let count: Symbol<PluginCountFn> = library.get(PLUGIN_COUNT_SYMBOL)?;
        let descriptor_at: Symbol<PluginAtFn> = library.get(PLUGIN_AT_SYMBOL)?;
        let mut effects = Vec::new();
        for index in 0..count() {
            let descriptor = descriptor_at(index);
            if descriptor.is_null() {
                continue;
            }
            let name_ptr = (*descriptor).name;
            if name_ptr.is_null() {
                continue;
            }
            let Ok(name) = CStr::from_ptr(name_ptr).to_str() else {
                continue;
            };
            effects.push(LoadedEffect {
                name: name.to_string(),
                version: (*descriptor).version,
                render: (*descriptor).render,
            });
        }
        Ok(effects)
    }
}

/// # Safety
///
/// A non-null `handle` must point to a live [`PropertySet`] and a non-null
/// `property` to a nul terminated string.
unsafe fn deref_args<'a>(
    handle: OfxPropertySetHandle,
    property: *const c_char,
) -> Result<(&'a mut PropertySet, &'a str), OfxStatus> {
    let Some(set) = (unsafe { (handle as *mut PropertySet).as_mut() }) else {
        return Err(OFX_STATUS_ERR_BAD_HANDLE);
    };
    if property.is_null() {
        return Err(OFX_STATUS_FAILED);
    }
    let Ok(key) = unsafe { CStr::from_ptr(property) }.to_str() else {
        return Err(OFX_STATUS_FAILED);
    };
    Ok((set, key))
}

macro_rules! unwrap_args {
    ($handle:expr, $property:expr) => {
        match unsafe { deref_args($handle, $property) } {
            Ok(args) => args,
            Err(status) => return status,
        }
    };
}

macro_rules! unwrap_index {
    ($index:expr) => {
        match usize::try_from($index) {
            Ok(index) => index,
            Err(_) => return OFX_STATUS_ERR_BAD_INDEX,
        }
    };
}

unsafe extern "C" fn prop_set_pointer(
    handle: OfxPropertySetHandle,
    property: *const c_char,
    index: c_int,
    value: *mut c_void,
) -> OfxStatus {
    let (set, key) = unwrap_args!(handle, property);
    let index = unwrap_index!(index);
    set.set_pointer(key, index, value);
    OFX_STATUS_OK
}

unsafe extern "C" fn prop_set_string(
    handle: OfxPropertySetHandle,
    property: *const c_char,
    index: c_int,
    value: *const c_char,
) -> OfxStatus {
    let (set, key) = unwrap_args!(handle, property);
    let index = unwrap_index!(index);
    if value.is_null() {
        return OFX_STATUS_FAILED;
    }
    let Ok(value) = (unsafe { CStr::from_ptr(value) }).to_str() else {
        return OFX_STATUS_FAILED;
    };
    set.set_string(key, index, value);
    OFX_STATUS_OK
}

unsafe extern "C" fn prop_set_double(
    handle: OfxPropertySetHandle,
    property: *const c_char,
    index: c_int,
    value: f64,
) -> OfxStatus {
    let (set, key) = unwrap_args!(handle, property);
    let index = unwrap_index!(index);
    set.set_double(key, index, value);
    OFX_STATUS_OK
}

unsafe extern "C" fn prop_set_int(
    handle: OfxPropertySetHandle,
    property: *const c_char,
    index: c_int,
    value: c_int,
) -> OfxStatus {
    let (set, key) = unwrap_args!(handle, property);
    let index = unwrap_index!(index);
    set.set_int(key, index, value);
    OFX_STATUS_OK
}

unsafe extern "C" fn prop_get_pointer(
    handle: OfxPropertySetHandle,
    property: *const c_char,
    index: c_int,
    value: *mut *mut c_void,
) -> OfxStatus {
    let (set, key) = unwrap_args!(handle, property);
    let index = unwrap_index!(index);
    if value.is_null() {
        return OFX_STATUS_ERR_BAD_HANDLE;
    }
    match set.pointer(key, index) {
        Some(found) => {
            unsafe { *value = found };
            OFX_STATUS_OK
        }
        None => OFX_STATUS_FAILED,
    }
}

unsafe extern "C" fn prop_get_string(
    handle: OfxPropertySetHandle,
    property: *const c_char,
    index: c_int,
    value: *mut *const c_char,
) -> OfxStatus {
    let (set, key) = unwrap_args!(handle, property);
    let index = unwrap_index!(index);
    if value.is_null() {
        return OFX_STATUS_ERR_BAD_HANDLE;
    }
    match set.string_ptr(key, index) {
        Some(found) => {
            unsafe { *value = found };
            OFX_STATUS_OK
        }
        None => OFX_STATUS_FAILED,
    }
}

unsafe extern "C" fn prop_get_double(
    handle: OfxPropertySetHandle,
    property: *const c_char,
    index: c_int,
    value: *mut f64,
) -> OfxStatus {
    let (set, key) = unwrap_args!(handle, property);
    let index = unwrap_index!(index);
    if value.is_null() {
        return OFX_STATUS_ERR_BAD_HANDLE;
    }
    match set.double(key, index) {
        Some(found) => {
            unsafe { *value = found };
            OFX_STATUS_OK
        }
        None => OFX_STATUS_FAILED,
    }
}

unsafe extern "C" fn prop_get_int(
    handle: OfxPropertySetHandle,
    property: *const c_char,
    index: c_int,
    value: *mut c_int,
) -> OfxStatus {
    let (set, key) = unwrap_args!(handle, property);
    let index = unwrap_index!(index);
    if value.is_null() {
        return OFX_STATUS_ERR_BAD_HANDLE;
    }
    match set.int(key, index) {
        Some(found) => {
            unsafe { *value = found };
            OFX_STATUS_OK
        }
        None => OFX_STATUS_FAILED,
    }
}

unsafe extern "C" fn prop_get_dimension(
    handle: OfxPropertySetHandle,
    property: *const c_char,
    value: *mut c_int,
) -> OfxStatus {
    let (set, key) = unwrap_args!(handle, property);
    if value.is_null() {
        return OFX_STATUS_ERR_BAD_HANDLE;
    }
    match set.dimension(key) {
        Some(dimension) => {
            unsafe { *value = dimension as c_int };
            OFX_STATUS_OK
        }
        None => OFX_STATUS_FAILED,
    }
}

unsafe extern "C" fn prop_reset(handle: OfxPropertySetHandle, property: *const c_char) -> OfxStatus {
    let (set, key) = unwrap_args!(handle, property);
    if set.reset(key) {
        OFX_STATUS_OK
    } else {
        OFX_STATUS_FAILED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suite_roundtrip_through_c_surface() {
        let mut set = PropertySet::default();
        let handle = property_set_handle(&mut set);
        let key = c"value";

        let status = unsafe { (PROPERTY_SUITE.prop_set_double)(handle, key.as_ptr(), 0, 2.5) };
        assert_eq!(status, OFX_STATUS_OK);

        let mut out = 0.0_f64;
        let status =
            unsafe { (PROPERTY_SUITE.prop_get_double)(handle, key.as_ptr(), 0, &mut out) };
        assert_eq!(status, OFX_STATUS_OK);
        assert_eq!(out, 2.5);

        let mut dimension: c_int = 0;
        let status =
            unsafe { (PROPERTY_SUITE.prop_get_dimension)(handle, key.as_ptr(), &mut dimension) };
        assert_eq!(status, OFX_STATUS_OK);
        assert_eq!(dimension, 1);
    }

    #[test]
    fn test_null_handle_is_rejected() {
        let mut out = 0.0_f64;
        let status = unsafe {
            (PROPERTY_SUITE.prop_get_double)(std::ptr::null_mut(), c"value".as_ptr(), 0, &mut out)
        };
        assert_eq!(status, OFX_STATUS_ERR_BAD_HANDLE);
    }

    #[test]
    fn test_negative_index_is_rejected() {
        let mut set = PropertySet::default();
        let handle = property_set_handle(&mut set);
        let status =
            unsafe { (PROPERTY_SUITE.prop_set_double)(handle, c"value".as_ptr(), -1, 1.0) };
        assert_eq!(status, OFX_STATUS_ERR_BAD_INDEX);
    }

    #[test]
    fn test_absent_value_fails() {
        let mut set = PropertySet::default();
        let handle = property_set_handle(&mut set);
        let mut out: c_int = 0;
        let status =
            unsafe { (PROPERTY_SUITE.prop_get_int)(handle, c"missing".as_ptr(), 0, &mut out) };
        assert_eq!(status, OFX_STATUS_FAILED);

        let status = unsafe { (PROPERTY_SUITE.prop_reset)(handle, c"missing".as_ptr()) };
        assert_eq!(status, OFX_STATUS_FAILED);
    }

    #[test]
    fn test_string_values_cross_the_boundary() {
        let mut set = PropertySet::default();
        let handle = property_set_handle(&mut set);
        let status = unsafe {
            (PROPERTY_SUITE.prop_set_string)(handle, c"label".as_ptr(), 0, c"wipe".as_ptr())
        };
        assert_eq!(status, OFX_STATUS_OK);

        let mut out: *const c_char = std::ptr::null();
        let status =
            unsafe { (PROPERTY_SUITE.prop_get_string)(handle, c"label".as_ptr(), 0, &mut out) };
        assert_eq!(status, OFX_STATUS_OK);
        let text = unsafe { CStr::from_ptr(out) }.to_str().expect("bad utf8");
        assert_eq!(text, "wipe");
    }

    unsafe extern "C" fn doubling_render(
        suite: *const PropertySuite,
        in_args: OfxPropertySetHandle,
        out_args: OfxPropertySetHandle,
    ) -> OfxStatus {
        let suite = unsafe { &*suite };
        let mut time = 0.0_f64;
        let status = unsafe { (suite.prop_get_double)(in_args, PROP_TIME_C.as_ptr(), 0, &mut time) };
        if status != OFX_STATUS_OK {
            return status;
        }
        unsafe { (suite.prop_set_double)(out_args, c"result".as_ptr(), 0, time * 2.0) }
    }

    #[test]
    fn test_call_render_shares_both_property_sets() {
        let mut in_args = PropertySet::default();
        in_args.set_double(PROP_TIME, 0, 1.5);
        let mut out_args = PropertySet::default();

        let status = call_render(doubling_render, &mut in_args, &mut out_args);
        assert_eq!(status, OFX_STATUS_OK);
        assert_eq!(out_args.double("result", 0), Some(3.0));
    }
}
