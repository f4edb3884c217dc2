//! Two small pixel filters exercising the kinograph plugin boundary: a
//! color invert and a brightness scale. Both read their images and
//! parameters exclusively through the property suite passed to render.

use std::ffi::{c_int, c_void};
use std::slice;

use kinograph::host::ofx::{
    OFX_STATUS_ERR_BAD_HANDLE, OFX_STATUS_FAILED, OFX_STATUS_OK, OfxPropertySetHandle, OfxStatus,
    PROP_OUTPUT_IMAGE_C, PROP_SOURCE_IMAGE_C, PluginDescriptor, PropertySuite, RawImage,
};

/// Copy the first source image into the output and run `shade` over each
/// RGBA pixel of the copy. Fails when the two images disagree on size.
unsafe fn filter_pixels(
    suite: *const PropertySuite,
    in_args: OfxPropertySetHandle,
    out_args: OfxPropertySetHandle,
    shade: impl Fn(&mut [u8]),
) -> OfxStatus {
    if suite.is_null() {
        return OFX_STATUS_ERR_BAD_HANDLE;
    }
    let suite = &*suite;

    let mut source_ptr: *mut c_void = std::ptr::null_mut();
    let status =
        (suite.prop_get_pointer)(in_args, PROP_SOURCE_IMAGE_C.as_ptr(), 0, &mut source_ptr);
    if status != OFX_STATUS_OK {
        return status;
    }
    let mut output_ptr: *mut c_void = std::ptr::null_mut();
    let status =
        (suite.prop_get_pointer)(out_args, PROP_OUTPUT_IMAGE_C.as_ptr(), 0, &mut output_ptr);
    if status != OFX_STATUS_OK {
        return status;
    }

    let source = source_ptr as *const RawImage;
    let output = output_ptr as *mut RawImage;
    if source.is_null() || output.is_null() {
        return OFX_STATUS_ERR_BAD_HANDLE;
    }
    let source = &*source;
    let output = &*output;
    if source.width != output.width || source.height != output.height {
        return OFX_STATUS_FAILED;
    }
    let len = source.width as usize * source.height as usize * 4;
    if len == 0 {
        return OFX_STATUS_OK;
    }
    if source.data.is_null() || output.data.is_null() {
        return OFX_STATUS_ERR_BAD_HANDLE;
    }

    let source = slice::from_raw_parts(source.data, len);
    let output = slice::from_raw_parts_mut(output.data, len);
    output.copy_from_slice(source);
    for pixel in output.chunks_exact_mut(4) {
        shade(pixel);
    }
    OFX_STATUS_OK
}

unsafe extern "C" fn invert_render(
    suite: *const PropertySuite,
    in_args: OfxPropertySetHandle,
    out_args: OfxPropertySetHandle,
) -> OfxStatus {
    filter_pixels(suite, in_args, out_args, |pixel| {
        pixel[0] = 255 - pixel[0];
        pixel[1] = 255 - pixel[1];
        pixel[2] = 255 - pixel[2];
    })
}

unsafe extern "C" fn brightness_render(
    suite: *const PropertySuite,
    in_args: OfxPropertySetHandle,
    out_args: OfxPropertySetHandle,
) -> OfxStatus {
    if suite.is_null() {
        return OFX_STATUS_ERR_BAD_HANDLE;
    }
    // The scale may arrive as a double or an int; when it is absent the
    // getter fails and the neutral default applies.
    let mut scale = 1.0_f64;
    let status = ((*suite).prop_get_double)(in_args, c"value".as_ptr(), 0, &mut scale);
    if status == OFX_STATUS_FAILED {
        let mut int_scale: c_int = 1;
        if ((*suite).prop_get_int)(in_args, c"value".as_ptr(), 0, &mut int_scale)
            == OFX_STATUS_OK
        {
            scale = int_scale as f64;
        }
    } else if status != OFX_STATUS_OK {
        return status;
    }

    filter_pixels(suite, in_args, out_args, |pixel| {
        for channel in &mut pixel[..3] {
            *channel = (*channel as f64 * scale).clamp(0.0, 255.0).round() as u8;
        }
    })
}

static INVERT: PluginDescriptor = PluginDescriptor {
    name: c"kinograph_basic:Invert".as_ptr(),
    version: 1,
    render: invert_render,
};

static BRIGHTNESS: PluginDescriptor = PluginDescriptor {
    name: c"kinograph_basic:Brightness".as_ptr(),
    version: 1,
    render: brightness_render,
};

#[no_mangle]
pub extern "C" fn kinograph_plugin_count() -> c_int {
    2
}

#[no_mangle]
pub extern "C" fn kinograph_plugin_at(index: c_int) -> *const PluginDescriptor {
    match index {
        0 => &INVERT,
        1 => &BRIGHTNESS,
        _ => std::ptr::null(),
    }
}
