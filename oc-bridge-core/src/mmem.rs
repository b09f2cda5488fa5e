//! Managed strings: views over `oc_mmem` blocks owned by the framework's memory pool.
//! Nothing here copies or frees; every view borrows from the block it was read from.

use std::ffi::{c_void, CStr};
use std::os::raw::c_char;
use std::ptr;
use std::slice;

/// Fixed slot width of one item in an `oc_string_array_t`.
pub const STRING_ARRAY_ITEM_MAX_LEN: usize = 32;

/// Raw `struct oc_mmem`: the layout shared by `oc_string_t`, `oc_array_t` and `oc_string_array_t`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct OcMmem {
    pub next: *mut OcMmem,
    /// Allocated bytes; for strings this includes the trailing NUL.
    pub size: usize,
    pub ptr: *mut c_void,
}

impl OcMmem {
    const fn empty() -> Self {
        Self {
            next: ptr::null_mut(),
            size: 0,
            ptr: ptr::null_mut(),
        }
    }
}

/// A managed string (`oc_string_t`), passed by value across the C boundary.
#[repr(transparent)]
#[derive(Debug, Clone, Copy)]
pub struct OcString(OcMmem);

impl OcString {
    /// The unallocated string (null pointer, zero size).
    pub const fn empty() -> Self {
        Self(OcMmem::empty())
    }

    /// Wrap a framework block.
    ///
    /// # Safety
    /// `mmem.ptr` must be null or point at `mmem.size` readable bytes ending in NUL, and stay
    /// valid and unmodified for as long as the returned value (or any view from it) is used.
    pub const unsafe fn from_mmem(mmem: OcMmem) -> Self {
        Self(mmem)
    }

    /// Wrap a NUL-terminated buffer of `size` bytes (NUL included).
    ///
    /// # Safety
    /// Same contract as [`OcString::from_mmem`].
    pub unsafe fn from_raw_parts(ptr: *const c_char, size: usize) -> Self {
        Self(OcMmem {
            next: ptr::null_mut(),
            size,
            ptr: ptr as *mut c_void,
        })
    }

    pub fn as_mmem(&self) -> &OcMmem {
        &self.0
    }

    pub fn is_null(&self) -> bool {
        self.0.ptr.is_null()
    }

    /// Text length in bytes, excluding the NUL.
    pub fn len(&self) -> usize {
        self.as_plain_text().map_or(0, |s| s.to_bytes().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrowed view of the text; `None` for an unallocated string.
    pub fn as_plain_text(&self) -> Option<&CStr> {
        if self.0.ptr.is_null() {
            return None;
        }
        // from_mmem/from_raw_parts guarantee a live NUL-terminated block.
        Some(unsafe { CStr::from_ptr(self.0.ptr as *const c_char) })
    }

    /// UTF-8 view of the text; `None` if unallocated or not UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        self.as_plain_text().and_then(|s| s.to_str().ok())
    }
}

/// Plain character pointer into the managed string's own storage (`oc_string(s)`).
/// Valid only while `string`'s block is alive and unmodified; null for an unallocated string.
pub fn string_to_plain_text(string: &OcString) -> *const c_char {
    string.0.ptr as *const c_char
}

/// A managed string array (`oc_string_array_t`): fixed-width NUL-padded slots.
#[repr(transparent)]
#[derive(Debug, Clone, Copy)]
pub struct OcStringArray(OcMmem);

impl OcStringArray {
    pub const fn empty() -> Self {
        Self(OcMmem::empty())
    }

    /// Wrap a framework block.
    ///
    /// # Safety
    /// `mmem.ptr` must be null or point at `mmem.size` readable bytes that stay valid and
    /// unmodified for as long as the returned value (or any view from it) is used.
    pub const unsafe fn from_mmem(mmem: OcMmem) -> Self {
        Self(mmem)
    }

    /// Wrap `size` bytes of slots starting at `ptr`.
    ///
    /// # Safety
    /// Same contract as [`OcStringArray::from_mmem`].
    pub unsafe fn from_raw_parts(ptr: *const u8, size: usize) -> Self {
        Self(OcMmem {
            next: ptr::null_mut(),
            size,
            ptr: ptr as *mut c_void,
        })
    }

    /// Number of allocated slots (`oc_string_array_get_allocated_size`).
    pub fn len(&self) -> usize {
        if self.0.ptr.is_null() {
            0
        } else {
            self.0.size / STRING_ARRAY_ITEM_MAX_LEN
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Item at `index`; `None` when out of range or the slot has no NUL.
    pub fn get(&self, index: usize) -> Option<&CStr> {
        if index >= self.len() {
            return None;
        }
        let slot = unsafe {
            slice::from_raw_parts(
                (self.0.ptr as *const u8).add(index * STRING_ARRAY_ITEM_MAX_LEN),
                STRING_ARRAY_ITEM_MAX_LEN,
            )
        };
        CStr::from_bytes_until_nul(slot).ok()
    }

    /// Non-empty items in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &CStr> + '_ {
        (0..self.len())
            .filter_map(move |i| self.get(i))
            .filter(|s| !s.to_bytes().is_empty())
    }
}

#[cfg(test)]
pub(crate) fn string_array_buffer(items: &[&str]) -> Vec<u8> {
    let mut buf = vec![0u8; items.len() * STRING_ARRAY_ITEM_MAX_LEN];
    for (i, item) in items.iter().enumerate() {
        let base = i * STRING_ARRAY_ITEM_MAX_LEN;
        buf[base..base + item.len()].copy_from_slice(item.as_bytes());
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn plain_text_points_into_same_storage() {
        let text = CString::new("/oic/d").unwrap();
        let s = unsafe { OcString::from_raw_parts(text.as_ptr(), text.as_bytes_with_nul().len()) };
        let p = string_to_plain_text(&s);
        assert_eq!(p, text.as_ptr());
        assert_eq!(unsafe { CStr::from_ptr(p) }, text.as_c_str());
    }

    #[test]
    fn borrowed_view_matches_text() {
        let text = CString::new("oic.r.switch.binary").unwrap();
        let s = unsafe { OcString::from_raw_parts(text.as_ptr(), text.as_bytes_with_nul().len()) };
        assert_eq!(s.as_plain_text(), Some(text.as_c_str()));
        assert_eq!(s.as_str(), Some("oic.r.switch.binary"));
        assert_eq!(s.len(), 19);
    }

    #[test]
    fn unallocated_string_has_no_text() {
        let s = OcString::empty();
        assert!(s.is_null());
        assert!(string_to_plain_text(&s).is_null());
        assert_eq!(s.as_plain_text(), None);
        assert!(s.is_empty());
    }

    #[test]
    fn allocated_empty_string_is_a_nul() {
        let text = CString::new("").unwrap();
        let s = unsafe { OcString::from_raw_parts(text.as_ptr(), 1) };
        let p = string_to_plain_text(&s);
        assert!(!p.is_null());
        assert_eq!(unsafe { *p }, 0);
        assert!(!s.is_null());
        assert!(s.is_empty());
        assert_eq!(s.as_plain_text().map(CStr::to_bytes), Some(&b""[..]));
        assert_eq!(s.as_str(), Some(""));
    }

    #[test]
    fn non_utf8_text_is_passed_through() {
        let text = CString::new(vec![0xff, 0xfe, b'a']).unwrap();
        let s = unsafe { OcString::from_raw_parts(text.as_ptr(), 4) };
        assert_eq!(string_to_plain_text(&s), text.as_ptr());
        assert_eq!(s.as_plain_text().map(CStr::to_bytes), Some(&[0xff, 0xfe, b'a'][..]));
        assert_eq!(s.len(), 3);
        assert_eq!(s.as_str(), None);
    }

    #[test]
    fn string_array_items() {
        let buf = string_array_buffer(&["oic.wk.d", "oic.d.light"]);
        let arr = unsafe { OcStringArray::from_raw_parts(buf.as_ptr(), buf.len()) };
        assert_eq!(arr.len(), 2);
        assert_eq!(arr.get(1).unwrap().to_str().unwrap(), "oic.d.light");
        assert!(arr.get(2).is_none());
        let items: Vec<&str> = arr.iter().map(|s| s.to_str().unwrap()).collect();
        assert_eq!(items, vec!["oic.wk.d", "oic.d.light"]);
    }

    #[test]
    fn string_array_skips_blank_slots() {
        let buf = string_array_buffer(&["oic.wk.p", "", "oic.wk.d"]);
        let arr = unsafe { OcStringArray::from_raw_parts(buf.as_ptr(), buf.len()) };
        assert_eq!(arr.len(), 3);
        assert_eq!(arr.iter().count(), 2);
    }

    #[test]
    fn unterminated_slot_is_skipped() {
        let buf = vec![b'x'; STRING_ARRAY_ITEM_MAX_LEN];
        let arr = unsafe { OcStringArray::from_raw_parts(buf.as_ptr(), buf.len()) };
        assert!(arr.get(0).is_none());
        assert!(OcStringArray::empty().is_empty());
    }
}
