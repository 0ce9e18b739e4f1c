//! Report parser registry
//!
//! Routes received reports to caller-owned parser strategies by report id.
//! The registry only borrows parsers: the `'p` lifetime ties every registered
//! parser to the driver, so a parser can never be dropped while the driver
//! can still dispatch to it.

/// Identity of the device a report came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReportContext {
    /// Device address
    pub address: u8,
    /// Endpoint number the report was read from
    pub endpoint: u8,
    /// Vendor ID
    pub vendor_id: u16,
    /// Product ID
    pub product_id: u16,
}

/// Report parsing strategy
///
/// Parsers are shared by reference, so implementations keep their state in
/// `Cell`s or atomics.
pub trait ReportParser {
    /// Consume one report
    ///
    /// When `has_report_id` is set, `data[0]` is the report id.
    fn parse(&self, ctx: &ReportContext, has_report_id: bool, data: &[u8]);
}

/// One registry slot; id 0 with no parser is a free slot
#[derive(Clone, Copy)]
struct ReportParserBinding<'p> {
    report_id: u8,
    parser: Option<&'p dyn ReportParser>,
}

impl ReportParserBinding<'_> {
    const EMPTY: Self = Self {
        report_id: 0,
        parser: None,
    };

    fn is_free(&self) -> bool {
        self.report_id == 0 && self.parser.is_none()
    }
}

/// Fixed-capacity report id to parser map
pub struct ReportParserRegistry<'p, const N: usize> {
    bindings: [ReportParserBinding<'p>; N],
}

impl<'p, const N: usize> ReportParserRegistry<'p, N> {
    /// Empty registry
    pub const fn new() -> Self {
        Self {
            bindings: [ReportParserBinding::EMPTY; N],
        }
    }

    /// Drop every binding
    pub fn clear(&mut self) {
        self.bindings = [ReportParserBinding::EMPTY; N];
    }

    /// Bind `parser` to `report_id` in the first free slot
    ///
    /// Returns `false` when the registry is full. Existing bindings for the
    /// same id are left alone.
    pub fn register(&mut self, report_id: u8, parser: &'p dyn ReportParser) -> bool {
        match self.bindings.iter_mut().find(|b| b.is_free()) {
            Some(slot) => {
                slot.report_id = report_id;
                slot.parser = Some(parser);
                true
            }
            None => false,
        }
    }

    /// Find the parser for a report
    ///
    /// Without report-id framing the first slot handles every report.
    pub fn resolve(&self, report_id: u8, has_report_id: bool) -> Option<&'p dyn ReportParser> {
        if !has_report_id {
            return self.bindings.first().and_then(|b| b.parser);
        }

        self.bindings
            .iter()
            .find(|b| b.report_id == report_id)
            .and_then(|b| b.parser)
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.bindings.iter().filter(|b| !b.is_free()).count()
    }

    /// True when no parser is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<const N: usize> Default for ReportParserRegistry<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}
