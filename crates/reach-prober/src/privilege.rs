/// Whether this process can open a raw ICMP socket without help from a
/// subprocess. On Unix that means effective UID 0 (or `CAP_NET_RAW`,
/// which we can't cheaply probe for, so root is the conservative check).
/// On Windows, raw ICMP sockets require an elevated token.
#[cfg(unix)]
pub fn has_raw_socket_privilege() -> bool {
    // SAFETY: geteuid takes no arguments and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(windows)]
pub fn has_raw_socket_privilege() -> bool {
    is_elevated().unwrap_or(false)
}

#[cfg(windows)]
fn is_elevated() -> Option<bool> {
    use std::mem;
    use windows_sys::Win32::Foundation::{CloseHandle, HANDLE};
    use windows_sys::Win32::System::Threading::{
        GetCurrentProcess, OpenProcessToken, TOKEN_QUERY,
    };

    unsafe {
        let process: HANDLE = GetCurrentProcess();
        let mut token: HANDLE = 0;
        if OpenProcessToken(process, TOKEN_QUERY, &mut token) == 0 {
            return None;
        }

        // TOKEN_ELEVATION struct: a single u32 "TokenIsElevated" field.
        let mut elevation: u32 = 0;
        let mut ret_len: u32 = 0;
        const TOKEN_ELEVATION: i32 = 20;
        let ok = windows_sys::Win32::Security::GetTokenInformation(
            token,
            TOKEN_ELEVATION,
            &mut elevation as *mut _ as *mut _,
            mem::size_of::<u32>() as u32,
            &mut ret_len,
        );
        CloseHandle(token);

        if ok == 0 {
            None
        } else {
            Some(elevation != 0)
        }
    }
}

#[cfg(not(any(unix, windows)))]
pub fn has_raw_socket_privilege() -> bool {
    false
}
