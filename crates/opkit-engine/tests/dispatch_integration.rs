//! End-to-end dispatch over the public API: a small formatting domain
//! with a specialized handler, a broad fallback, and a composite that
//! delegates through `forward_to` under a hint overlay.

use opkit_core::{
    Bound, Catalog, CatalogBuilder, KindId, KindProjection, KindSpec, ParamRef, ParentArg, TypeId,
    TypeSpec,
};
use opkit_engine::{
    DispatchContext, DispatchResult, Handler, HandlerRegistry, HandlerTag, OpIdentity, OpValue,
    Operation, ResultSlot,
};
use rustc_hash::FxHashMap;
use std::any::Any;
use std::rc::Rc;
use std::sync::Arc;

struct Domain {
    catalog: Arc<Catalog>,
    decimal: TypeId,
    dec: TypeId,
    text: TypeId,
    value: TypeId,
    format: KindId,
    localize: KindId,
}

fn domain() -> Domain {
    let mut builder = CatalogBuilder::new();
    let value = builder.ty(TypeSpec::new("Value")).unwrap();
    let numeric = builder.ty(TypeSpec::new("Numeric").extends(value)).unwrap();
    let decimal = builder
        .ty(TypeSpec::new("Decimal").extends(numeric))
        .unwrap();
    let dec = builder.ty(TypeSpec::new("dec").twin_of(decimal)).unwrap();
    let text = builder.ty(TypeSpec::new("Text").extends(value)).unwrap();

    let format = builder
        .kind(
            KindSpec::new("Format")
                .param("INPUT")
                .param("OUTPUT")
                .result("OUTPUT"),
        )
        .unwrap();
    let localize = builder
        .kind(
            KindSpec::new("Localize")
                .param("INPUT")
                .extends(format, [ParentArg::Own(0), ParentArg::Type(text)]),
        )
        .unwrap();

    Domain {
        catalog: Arc::new(builder.build()),
        decimal,
        dec,
        text,
        value,
        format,
        localize,
    }
}

struct FormatOp {
    kind: KindId,
    payload: String,
    args: FxHashMap<ParamRef, TypeId>,
    slot: ResultSlot,
}

impl FormatOp {
    fn new(domain: &Domain, payload: &str, input: TypeId, output: TypeId) -> Self {
        FormatOp {
            kind: domain.format,
            payload: payload.to_string(),
            args: domain
                .catalog
                .bind_actuals(domain.format, &[Some(input), Some(output)]),
            slot: ResultSlot::new(),
        }
    }
}

impl Operation for FormatOp {
    fn kind(&self) -> KindId {
        self.kind
    }

    fn type_arg(&self, param: ParamRef) -> Option<TypeId> {
        self.args.get(&param).copied()
    }

    fn identity(&self) -> OpIdentity {
        OpIdentity::new(self.kind).text(self.payload.as_str())
    }

    fn slot(&self) -> &ResultSlot {
        &self.slot
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct LocalizeOp {
    kind: KindId,
    payload: String,
    input: TypeId,
    args: FxHashMap<ParamRef, TypeId>,
    slot: ResultSlot,
}

impl LocalizeOp {
    fn new(domain: &Domain, payload: &str, input: TypeId) -> Self {
        LocalizeOp {
            kind: domain.localize,
            payload: payload.to_string(),
            input,
            args: domain.catalog.bind_actuals(domain.localize, &[Some(input)]),
            slot: ResultSlot::new(),
        }
    }
}

impl Operation for LocalizeOp {
    fn kind(&self) -> KindId {
        self.kind
    }

    fn type_arg(&self, param: ParamRef) -> Option<TypeId> {
        self.args.get(&param).copied()
    }

    fn identity(&self) -> OpIdentity {
        OpIdentity::new(self.kind).text(self.payload.as_str()).ty(self.input)
    }

    fn slot(&self) -> &ResultSlot {
        &self.slot
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Formats decimals with two fraction digits. `Format<Decimal, Text>`.
struct DecimalFormatter {
    projection: KindProjection,
}

impl DecimalFormatter {
    fn new(domain: &Domain) -> Arc<Self> {
        Arc::new(DecimalFormatter {
            projection: KindProjection::new(
                domain.format,
                [Bound::Exact(domain.decimal), Bound::Exact(domain.text)],
            ),
        })
    }
}

impl Handler for DecimalFormatter {
    fn projection(&self) -> &KindProjection {
        &self.projection
    }

    fn tag(&self) -> HandlerTag {
        HandlerTag::of::<Self>()
    }

    fn supports(&self, _cx: &DispatchContext, op: &dyn Operation) -> bool {
        op.as_any()
            .downcast_ref::<FormatOp>()
            .is_some_and(|op| op.payload.parse::<f64>().is_ok())
    }

    fn perform(&self, _cx: &DispatchContext, op: &dyn Operation) -> DispatchResult<()> {
        if let Some(format) = op.as_any().downcast_ref::<FormatOp>() {
            if let Ok(value) = format.payload.parse::<f64>() {
                op.slot().succeed(Rc::new(format!("{value:.2}")));
            }
        }
        Ok(())
    }
}

/// Broad fallback: echoes the payload. `Format<Value, Text>`.
struct EchoFormatter {
    projection: KindProjection,
}

impl EchoFormatter {
    fn new(domain: &Domain) -> Arc<Self> {
        Arc::new(EchoFormatter {
            projection: KindProjection::new(
                domain.format,
                [Bound::Exact(domain.value), Bound::Exact(domain.text)],
            ),
        })
    }
}

impl Handler for EchoFormatter {
    fn projection(&self) -> &KindProjection {
        &self.projection
    }

    fn tag(&self) -> HandlerTag {
        HandlerTag::of::<Self>()
    }

    fn supports(&self, _cx: &DispatchContext, _op: &dyn Operation) -> bool {
        true
    }

    fn perform(&self, _cx: &DispatchContext, op: &dyn Operation) -> DispatchResult<()> {
        if let Some(format) = op.as_any().downcast_ref::<FormatOp>() {
            op.slot().succeed(Rc::new(format.payload.clone()));
        }
        Ok(())
    }
}

/// Localizes by forwarding to a plain `Format` operation and prefixing
/// the result with the `locale` hint. Depends on the decimal formatter.
struct HintedLocalizer {
    projection: KindProjection,
    catalog: Arc<Catalog>,
    format: KindId,
    text: TypeId,
}

impl HintedLocalizer {
    fn new(domain: &Domain) -> Arc<Self> {
        Arc::new(HintedLocalizer {
            projection: KindProjection::any(domain.localize, 1),
            catalog: Arc::clone(&domain.catalog),
            format: domain.format,
            text: domain.text,
        })
    }
}

impl Handler for HintedLocalizer {
    fn projection(&self) -> &KindProjection {
        &self.projection
    }

    fn tag(&self) -> HandlerTag {
        HandlerTag::of::<Self>()
    }

    fn dependencies(&self) -> Vec<HandlerTag> {
        vec![HandlerTag::of::<DecimalFormatter>()]
    }

    fn supports(&self, _cx: &DispatchContext, _op: &dyn Operation) -> bool {
        true
    }

    fn perform(&self, cx: &DispatchContext, op: &dyn Operation) -> DispatchResult<()> {
        let Some(localize) = op.as_any().downcast_ref::<LocalizeOp>() else {
            return Ok(());
        };
        let locale = cx
            .hint_as::<String>("locale")
            .map(|l| l.as_str().to_string())
            .unwrap_or_else(|| "und".to_string());
        let nested = FormatOp {
            kind: self.format,
            payload: localize.payload.clone(),
            args: self
                .catalog
                .bind_actuals(self.format, &[Some(localize.input), Some(self.text)]),
            slot: ResultSlot::new(),
        };
        cx.forward_to(&nested, |formatted| {
            if let Ok(text) = formatted.downcast::<String>() {
                op.slot().succeed(Rc::new(format!("[{locale}] {text}")));
            }
        })?;
        Ok(())
    }
}

fn engine(domain: &Domain, handlers: Vec<Arc<dyn Handler>>) -> DispatchContext {
    let registry = HandlerRegistry::new(Arc::clone(&domain.catalog), handlers).unwrap();
    DispatchContext::new(Arc::new(registry))
}

#[test]
fn specific_formatter_wins_over_fallback() {
    let domain = domain();
    let handlers: Vec<Arc<dyn Handler>> =
        vec![EchoFormatter::new(&domain), DecimalFormatter::new(&domain)];
    let cx = engine(&domain, handlers);

    let op = FormatOp::new(&domain, "3.14159", domain.decimal, domain.text);
    let result = cx.eval(&op).unwrap();
    assert_eq!(result.downcast_ref::<String>().unwrap(), "3.14");

    // Unparseable decimal payload drops to the echo fallback.
    let op = FormatOp::new(&domain, "n/a", domain.decimal, domain.text);
    let result = cx.eval(&op).unwrap();
    assert_eq!(result.downcast_ref::<String>().unwrap(), "n/a");
}

#[test]
fn primitive_twin_reaches_the_boxed_formatter() {
    let domain = domain();
    let handlers: Vec<Arc<dyn Handler>> = vec![DecimalFormatter::new(&domain)];
    let cx = engine(&domain, handlers);

    let op = FormatOp::new(&domain, "2.5", domain.dec, domain.text);
    let result = cx.eval(&op).unwrap();
    assert_eq!(result.downcast_ref::<String>().unwrap(), "2.50");
}

#[test]
fn localization_forwards_under_a_hint_overlay() {
    let domain = domain();
    let handlers: Vec<Arc<dyn Handler>> = vec![
        HintedLocalizer::new(&domain),
        DecimalFormatter::new(&domain),
        EchoFormatter::new(&domain),
    ];
    let cx = engine(&domain, handlers);

    let rendered = cx
        .with_hints(
            vec![("locale".to_string(), Rc::new("de-DE".to_string()) as OpValue)],
            |cx| {
                let op = LocalizeOp::new(&domain, "19.999", domain.decimal);
                cx.eval(&op).unwrap()
            },
        )
        .unwrap();
    assert_eq!(rendered.downcast_ref::<String>().unwrap(), "[de-DE] 20.00");

    // No overlay in scope: the localizer falls back to its default tag.
    let op = LocalizeOp::new(&domain, "plain", domain.value);
    let rendered = cx.eval(&op).unwrap();
    assert_eq!(rendered.downcast_ref::<String>().unwrap(), "[und] plain");
}

#[test]
fn missing_dependency_is_rejected_at_construction() {
    let domain = domain();
    let handlers: Vec<Arc<dyn Handler>> = vec![HintedLocalizer::new(&domain)];
    assert!(HandlerRegistry::new(Arc::clone(&domain.catalog), handlers).is_err());
}
