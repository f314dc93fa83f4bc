
use crate::{Catalog, CatalogBuilder, KindSpec, ParentArg, TypeSpec};

/// Catalog shared by the descriptor tests: a small numeric/text type
/// lattice and a three-level conversion kind hierarchy.
///
/// Types:   Object ← Number ← Integer (⇄ int), Object ← String
/// Kinds:   Transform<SOURCE, TARGET=result>
///          ← Convert<SOURCE, TARGET> (aliases both up)
///          ← ConvertToString<SOURCE> (fixes TARGET to String)
pub(crate) fn sample_catalog() -> Catalog {
    let mut builder = CatalogBuilder::new();

    let object = builder.ty(TypeSpec::new("Object")).unwrap();
    let number = builder.ty(TypeSpec::new("Number").extends(object)).unwrap();
    let integer = builder.ty(TypeSpec::new("Integer").extends(number)).unwrap();
    builder.ty(TypeSpec::new("int").twin_of(integer)).unwrap();
    let string = builder.ty(TypeSpec::new("String").extends(object)).unwrap();

    let transform = builder
        .kind(
            KindSpec::new("Transform")
                .param("SOURCE")
                .param("TARGET")
                .result("TARGET"),
        )
        .unwrap();
    let convert = builder
        .kind(
            KindSpec::new("Convert")
                .param("SOURCE")
                .param("TARGET")
                .extends(transform, [ParentArg::Own(0), ParentArg::Own(1)]),
        )
        .unwrap();
    builder
        .kind(
            KindSpec::new("ConvertToString")
                .param("SOURCE")
                .extends(convert, [ParentArg::Own(0), ParentArg::Type(string)]),
        )
        .unwrap();

    builder.build()
}
