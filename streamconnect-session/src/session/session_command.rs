/// Control requests a client can issue against a running call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    SetMicEnabled(bool),
    SetCameraEnabled(bool),
    StartScreenShare,
    StopScreenShare,
    EndCall,
}
