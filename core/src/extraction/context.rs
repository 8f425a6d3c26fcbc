use crate::diagnostics::Diagnostics;
use crate::error::LookupResult;
use dicom_object::InMemDicomObject;

use super::readers::ReaderRegistry;

/// Everything a resolver tier may consult
///
/// The dataset is read once and never changes while tables are built.
#[derive(Clone, Copy)]
pub struct ResolveContext<'a> {
    pub dcm: &'a InMemDicomObject,
    pub readers: &'a ReaderRegistry,
    pub diagnostics: Diagnostics,
}

impl<'a> ResolveContext<'a> {
    pub fn new(
        dcm: &'a InMemDicomObject,
        readers: &'a ReaderRegistry,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            dcm,
            readers,
            diagnostics,
        }
    }

    /// Runs one resolution tier
    ///
    /// A failed tier is logged at debug level and turned into `None`, so tiers
    /// chain with `Option::or_else` and the first success wins.
    pub fn attempt<F>(&self, table: &str, attribute: &str, tier: &str, f: F) -> Option<String>
    where
        F: FnOnce() -> LookupResult<String>,
    {
        match f() {
            Ok(value) => Some(value),
            Err(e) => {
                self.diagnostics.debug(format_args!(
                    "{}.{}: {} lookup failed: {}",
                    table, attribute, tier, e
                ));
                None
            }
        }
    }

    /// Runs the special reader registered for (scope, attribute), if any
    pub fn special(&self, table: &str, scope: &str, attribute: &str) -> Option<String> {
        let reader = self.readers.get(scope, attribute)?;
        self.attempt(table, attribute, "special reader", || reader(self.dcm))
    }

    /// Records that every tier failed for an attribute
    pub fn unresolved(&self, table: &str, attribute: &str) {
        self.diagnostics.debug(format_args!(
            "{}.{}: unresolved, recorded as null",
            table, attribute
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::capture::CaptureLogger;
    use crate::error::LookupError;
    use log::Level;

    #[test]
    fn test_attempt_chain_first_success_wins() {
        let logger = CaptureLogger::leak();
        let dcm = InMemDicomObject::new_empty();
        let readers = ReaderRegistry::empty();
        let ctx = ResolveContext::new(&dcm, &readers, Diagnostics::new(logger));

        let value = ctx
            .attempt("MR", "EchoTime", "direct", || {
                Err(LookupError::NotFound("EchoTime".to_string()))
            })
            .or_else(|| ctx.attempt("MR", "EchoTime", "fallback", || Ok("12".to_string())))
            .or_else(|| ctx.attempt("MR", "EchoTime", "never", || panic!("not reached")));

        assert_eq!(value, Some("12".to_string()));
        assert_eq!(
            logger.lines(),
            vec![(
                Level::Debug,
                "MR.EchoTime: direct lookup failed: EchoTime not found".to_string()
            )]
        );
    }

    #[test]
    fn test_special_without_reader() {
        let dcm = InMemDicomObject::new_empty();
        let readers = ReaderRegistry::standard();
        let ctx = ResolveContext::new(&dcm, &readers, Diagnostics::disabled());
        assert_eq!(ctx.special("MR", "MR", "PatientID"), None);
        assert_eq!(ctx.special("RWV", "RWV", "Units_CodeValue"), None);
    }
}
