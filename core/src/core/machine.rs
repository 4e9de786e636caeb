/// Machine-agnostic interface for emulated systems.
///
/// The frontend is a pure rendering engine: it pulls pixel rows and audio
/// samples and knows nothing about bridges, display lists or PIX framing.
pub trait Machine {
    /// Native display resolution as (width, height) in pixels.
    fn display_size(&self) -> (u32, u32);

    /// Run one frame of emulation (advance the clock by one frame's worth of
    /// scanlines and audio samples).
    fn run_frame(&mut self);

    /// Render the current video state into an RGB24 pixel buffer.
    ///
    /// The buffer must be at least `width * height * 3` bytes (from
    /// `display_size()`). Pixels are stored left-to-right, top-to-bottom,
    /// 3 bytes per pixel (R, G, B).
    fn render_frame(&self, buffer: &mut [u8]);

    /// Take the stereo samples accumulated since the last call.
    /// Interleaved left/right, one pair per internal sample tick.
    fn drain_audio(&mut self) -> Vec<(i32, i32)>;

    /// Reset the machine to its initial power-on state.
    fn reset(&mut self);
}
