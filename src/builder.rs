use crate::decoder::Decoder;

/// Knobs for a [`Decoder`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Spread each time step over the rayon pool. Needs the `parallel`
    /// feature; ignored without it.
    pub parallel: bool,
    /// Keep the full trellis in the returned [`ViterbiPath`](crate::ViterbiPath).
    pub retain_trellis: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DecoderBuilder {
    config: DecoderConfig,
}

impl DecoderBuilder {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }
    pub fn retain_trellis(mut self, retain: bool) -> Self {
        self.config.retain_trellis = retain;
        self
    }
    pub fn build(self) -> Decoder {
        Decoder::with_config(self.config)
    }
}
