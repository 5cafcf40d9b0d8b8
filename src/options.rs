/// Per-call switches for the encode/decode engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Allow decimal numbers to stand in for `int` (zero fraction only) and
    /// `float`, both when decoding and when instance-checking.
    pub cast_decimal: bool,
    /// Encode `Decimal` as a JSON number instead of its string form.
    pub decimals_as_numbers: bool,
    /// Encode records positionally, as lists, instead of as maps.
    pub records_as_lists: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            cast_decimal: true,
            decimals_as_numbers: false,
            records_as_lists: false,
        }
    }
}

impl Options {
    pub fn new() -> Self { Self::default() }
    pub fn with_cast_decimal(mut self, on: bool) -> Self { self.cast_decimal = on; self }
    pub fn with_decimals_as_numbers(mut self, on: bool) -> Self { self.decimals_as_numbers = on; self }
    pub fn with_records_as_lists(mut self, on: bool) -> Self { self.records_as_lists = on; self }

    /// Same switches with decimal casting off, for checks that must be exact.
    pub(crate) fn strict(self) -> Self { Self { cast_decimal: false, ..self } }
}
