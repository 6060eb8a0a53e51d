use warden_core::ProcessTerminator;

#[cfg(unix)]
use warden_unix::UnixTerminator;
#[cfg(windows)]
use warden_windows::WindowsTerminator;

/// Terminator for the current platform.
pub(crate) fn platform_terminator() -> Box<dyn ProcessTerminator> {
    #[cfg(unix)]
    {
        Box::new(UnixTerminator::new())
    }

    #[cfg(windows)]
    {
        Box::new(WindowsTerminator::new())
    }

    #[cfg(not(any(unix, windows)))]
    {
        compile_error!("Unsupported platform: only Unix and Windows are currently supported");
    }
}

pub(crate) fn platform_name() -> &'static str {
    #[cfg(unix)]
    {
        "Unix"
    }

    #[cfg(windows)]
    {
        "Windows"
    }

    #[cfg(not(any(unix, windows)))]
    {
        "Unknown"
    }
}
