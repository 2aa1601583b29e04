/// Feedback echo used on the delay send.
///
/// The buffer is sized once from the sample rate and never grows, so the
/// render path does not allocate. A one-pole lowpass in the feedback loop makes
/// each repeat a little darker than the last.
pub struct FeedbackDelay {
    buffer: Vec<f32>,
    write_pos: usize,
    delay_samples: usize,
    feedback: f32,
    damp: f32,
    damp_state: f32,
}

impl FeedbackDelay {
    pub fn new(max_delay_ms: f32, sample_rate: f32) -> Self {
        let len = ((max_delay_ms / 1000.0) * sample_rate).ceil().max(2.0) as usize;
        Self {
            buffer: vec![0.0; len],
            write_pos: 0,
            delay_samples: len - 1,
            feedback: 0.3,
            damp: 0.3,
            damp_state: 0.0,
        }
    }

    pub fn set_delay_ms(&mut self, delay_ms: f32, sample_rate: f32) {
        let samples = ((delay_ms / 1000.0) * sample_rate) as usize;
        self.delay_samples = samples.clamp(1, self.buffer.len() - 1);
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.95);
    }

    pub fn set_damping(&mut self, damp: f32) {
        self.damp = damp.clamp(0.0, 1.0);
    }

    /// Returns the wet signal only.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let len = self.buffer.len();
        let read_pos = (self.write_pos + len - self.delay_samples) % len;
        let delayed = self.buffer[read_pos];

        self.damp_state = delayed * (1.0 - self.damp) + self.damp_state * self.damp;
        self.buffer[self.write_pos] = input + self.damp_state * self.feedback;
        self.write_pos = (self.write_pos + 1) % len;

        delayed
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.damp_state = 0.0;
        self.write_pos = 0;
    }
}
