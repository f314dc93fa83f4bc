use super::fixtures::{
    AnyToNumberHandler, CopyViaConvertHandler, Fixture, StringToIntHandler,
};
use crate::{ConfigError, Handler, HandlerRegistry, HandlerTag};
use opkit_core::{Bound, KindProjection, ParamRef};
use std::sync::Arc;

#[test]
fn buckets_are_specificity_sorted() {
    let fx = Fixture::new();
    let broad = AnyToNumberHandler::new(&fx);
    let narrow = StringToIntHandler::new(&fx);
    // Registration order is broad-first; the bucket must not be.
    let handlers: Vec<Arc<dyn Handler>> = vec![broad.clone(), narrow.clone()];
    let registry = HandlerRegistry::new(Arc::clone(&fx.catalog), handlers).unwrap();

    let bucket = registry.bucket(fx.convert);
    assert_eq!(bucket.len(), 2);
    assert_eq!(bucket[0].tag(), narrow.tag());
    assert_eq!(bucket[1].tag(), broad.tag());
    assert!(registry.bucket(fx.transform).is_empty());
}

#[test]
fn registry_debug_summarizes_buckets() {
    let fx = Fixture::new();
    let broad = AnyToNumberHandler::new(&fx);
    let narrow = StringToIntHandler::new(&fx);
    let handlers: Vec<Arc<dyn Handler>> = vec![broad, narrow];
    let registry = HandlerRegistry::new(Arc::clone(&fx.catalog), handlers).unwrap();

    let rendered = format!("{registry:?}");
    assert_eq!(rendered, "HandlerRegistry { kinds: 1, handlers: 2 }");
}

#[test]
fn candidates_walk_the_kind_chain_most_derived_first() {
    let fx = Fixture::new();

    struct TransformFallback {
        projection: KindProjection,
    }
    impl Handler for TransformFallback {
        fn projection(&self) -> &KindProjection {
            &self.projection
        }
        fn tag(&self) -> HandlerTag {
            HandlerTag::of::<Self>()
        }
        fn supports(&self, _cx: &crate::DispatchContext, _op: &dyn crate::Operation) -> bool {
            true
        }
        fn perform(
            &self,
            _cx: &crate::DispatchContext,
            _op: &dyn crate::Operation,
        ) -> crate::DispatchResult<()> {
            Ok(())
        }
    }

    let fallback = Arc::new(TransformFallback {
        projection: KindProjection::any(fx.transform, 2),
    });
    let narrow = StringToIntHandler::new(&fx);
    let handlers: Vec<Arc<dyn Handler>> = vec![fallback.clone(), narrow.clone()];
    let registry = HandlerRegistry::new(Arc::clone(&fx.catalog), handlers).unwrap();

    // An operation of kind Convert sees the Convert bucket, then the
    // Transform bucket.
    let order: Vec<HandlerTag> = registry
        .candidates_for(fx.convert)
        .map(|h| h.tag())
        .collect();
    assert_eq!(order, vec![narrow.tag(), fallback.tag()]);

    // An operation of kind Transform never sees Convert handlers.
    let order: Vec<HandlerTag> = registry
        .candidates_for(fx.transform)
        .map(|h| h.tag())
        .collect();
    assert_eq!(order, vec![fallback.tag()]);
}

#[test]
fn missing_dependency_fails_construction_naming_the_handler() {
    let fx = Fixture::new();
    // CopyViaConvertHandler depends on StringToIntHandler, not supplied.
    let composite = CopyViaConvertHandler::new(&fx);
    let handlers: Vec<Arc<dyn Handler>> = vec![composite];
    let err = HandlerRegistry::new(Arc::clone(&fx.catalog), handlers).unwrap_err();

    match err {
        ConfigError::MissingDependency { handler, missing } => {
            assert!(handler.contains("CopyViaConvertHandler"));
            assert_eq!(missing.len(), 1);
            assert!(missing[0].contains("StringToIntHandler"));
        }
        other => panic!("expected MissingDependency, got {other:?}"),
    }
}

#[test]
fn satisfied_dependency_passes_validation() {
    let fx = Fixture::new();
    let composite = CopyViaConvertHandler::new(&fx);
    let converter = StringToIntHandler::new(&fx);
    let handlers: Vec<Arc<dyn Handler>> = vec![composite, converter];
    assert!(HandlerRegistry::new(Arc::clone(&fx.catalog), handlers).is_ok());
}

#[test]
fn open_constraint_fails_construction() {
    let fx = Fixture::new();

    struct OpenHandler {
        projection: KindProjection,
    }
    impl Handler for OpenHandler {
        fn projection(&self) -> &KindProjection {
            &self.projection
        }
        fn tag(&self) -> HandlerTag {
            HandlerTag::of::<Self>()
        }
        fn supports(&self, _cx: &crate::DispatchContext, _op: &dyn crate::Operation) -> bool {
            false
        }
        fn perform(
            &self,
            _cx: &crate::DispatchContext,
            _op: &dyn crate::Operation,
        ) -> crate::DispatchResult<()> {
            Ok(())
        }
    }

    let open = Arc::new(OpenHandler {
        projection: KindProjection::new(
            fx.convert,
            [Bound::Param(ParamRef::new(fx.transform, 0)), Bound::Any],
        ),
    });
    let handlers: Vec<Arc<dyn Handler>> = vec![open];
    let err = HandlerRegistry::new(Arc::clone(&fx.catalog), handlers).unwrap_err();
    assert!(matches!(err, ConfigError::OpenConstraint { .. }));
}

#[test]
fn projection_arity_mismatch_fails_construction() {
    let fx = Fixture::new();

    struct LopsidedHandler {
        projection: KindProjection,
    }
    impl Handler for LopsidedHandler {
        fn projection(&self) -> &KindProjection {
            &self.projection
        }
        fn tag(&self) -> HandlerTag {
            HandlerTag::of::<Self>()
        }
        fn supports(&self, _cx: &crate::DispatchContext, _op: &dyn crate::Operation) -> bool {
            false
        }
        fn perform(
            &self,
            _cx: &crate::DispatchContext,
            _op: &dyn crate::Operation,
        ) -> crate::DispatchResult<()> {
            Ok(())
        }
    }

    let lopsided = Arc::new(LopsidedHandler {
        projection: KindProjection::new(fx.convert, [Bound::Any]),
    });
    let handlers: Vec<Arc<dyn Handler>> = vec![lopsided];
    let err = HandlerRegistry::new(Arc::clone(&fx.catalog), handlers).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::ProjectionArity {
            given: 1,
            expected: 2,
            ..
        }
    ));
}
