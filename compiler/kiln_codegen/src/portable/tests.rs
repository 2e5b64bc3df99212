use super::*;
use kiln_ir::{Argument, Linkage};
use pretty_assertions::assert_eq;

fn target(s: &str) -> Target {
    s.parse().unwrap()
}

fn lower(function: Function) -> String {
    let module = Module::new("m", target("x86-64-linux")).with_function(function);
    let mut ctx = ModuleContext::new(&module);
    Lowerer::new(&mut ctx).lower_function(&module.functions()[0])
}

#[test]
fn test_llvm_triple() {
    assert_eq!(llvm_triple(&target("x86-64-linux")), "x86_64-unknown-linux-gnu");
    assert_eq!(llvm_triple(&target("x86-32-windows")), "i386-pc-windows-msvc");
    assert_eq!(
        llvm_triple(&target("x86-64-windows-mingw")),
        "x86_64-pc-windows-gnu"
    );
    assert_eq!(llvm_triple(&target("arm-64-ios")), "aarch64-apple-ios");
    assert_eq!(llvm_triple(&target("arm-32-ios-armv7s")), "armv7s-apple-ios");
    assert_eq!(llvm_triple(&target("pnacl-32-nacl")), "le32-unknown-nacl");
}

#[test]
fn test_float_literal_is_exact_hex() {
    assert_eq!(float_literal(1.0, ScalarType::F64), "0x3FF0000000000000");
    // 0.1f widened to double, not the double nearest 0.1
    assert_eq!(float_literal(0.1, ScalarType::F32), "0x3FB99999A0000000");
}

#[test]
fn test_default_return() {
    let text = lower(Function::new("f", ScalarType::F32));
    assert_eq!(
        text,
        "define float @f() {\nentry:\n  ret float 0x0000000000000000\n}\n"
    );
}

#[test]
fn test_internal_linkage_and_params() {
    let text = lower(
        Function::new("ns::g", ScalarType::I32)
            .with_linkage(Linkage::Internal)
            .with_arg(Argument::buffer("data", ScalarType::U8))
            .with_arg(Argument::scalar("n", ScalarType::I32))
            .with_body(vec![Stmt::Return(Expr::var("n", ScalarType::I32))]),
    );
    assert!(text.starts_with("define internal i32 @ns_g(ptr %data, i32 %n) {\n"));
    assert!(text.contains("  ret i32 %n\n"));
}

#[test]
fn test_arithmetic_selection() {
    let x = Expr::var("x", ScalarType::U32);
    let y = Expr::var("y", ScalarType::F32);
    let text = lower(
        Function::new("f", ScalarType::I32)
            .with_arg(Argument::scalar("x", ScalarType::U32))
            .with_arg(Argument::scalar("y", ScalarType::F32))
            .with_body(vec![
                Stmt::let_("a", Expr::binary(BinaryOp::Div, x.clone(), Expr::var("x", ScalarType::U32))),
                Stmt::let_("b", Expr::binary(BinaryOp::Mod, y.clone(), y.clone())),
                Stmt::let_("c", Expr::binary(BinaryOp::Lt, x.clone(), x)),
                Stmt::let_("d", Expr::binary(BinaryOp::Ge, y.clone(), y)),
                Stmt::Return(Expr::int(0)),
            ]),
    );
    assert!(text.contains("%.t0 = udiv i32 %x, %x\n"));
    assert!(text.contains("%.t1 = frem float %y, %y\n"));
    assert!(text.contains("%.t2 = icmp ult i32 %x, %x\n"));
    assert!(text.contains("%.t3 = fcmp oge float %y, %y\n"));
}

#[test]
fn test_min_max_use_intrinsics() {
    let module = Module::new("m", target("x86-64-linux")).with_function(
        Function::new("f", ScalarType::I32)
            .with_arg(Argument::scalar("a", ScalarType::I32))
            .with_body(vec![Stmt::Return(Expr::binary(
                BinaryOp::Min,
                Expr::var("a", ScalarType::I32),
                Expr::int(255),
            ))]),
    );
    let text = portable_text(&module);
    assert!(text.contains("%.t0 = call i32 @llvm.smin.i32(i32 %a, i32 255)\n"));
    assert!(text.contains("declare i32 @llvm.smin.i32(i32, i32)\n"));
}

#[test]
fn test_casts() {
    let text = lower(
        Function::new("f", ScalarType::I32)
            .with_arg(Argument::scalar("b", ScalarType::U8))
            .with_arg(Argument::scalar("v", ScalarType::F64))
            .with_body(vec![
                Stmt::let_("w", Expr::cast(ScalarType::I32, Expr::var("b", ScalarType::U8))),
                Stmt::let_("s", Expr::cast(ScalarType::F32, Expr::var("v", ScalarType::F64))),
                Stmt::let_("i", Expr::cast(ScalarType::I32, Expr::var("v", ScalarType::F64))),
                Stmt::let_("u", Expr::cast(ScalarType::I8, Expr::var("b", ScalarType::U8))),
                Stmt::Return(Expr::var("w", ScalarType::I32)),
            ]),
    );
    assert!(text.contains("%.t0 = zext i8 %b to i32\n"));
    assert!(text.contains("%.t1 = fptrunc double %v to float\n"));
    assert!(text.contains("%.t2 = fptosi double %v to i32\n"));
    assert!(!text.contains("%.t3"), "same-width cast emits nothing");
    assert!(text.contains("ret i32 %.t0\n"));
}

#[test]
fn test_loop_with_load_and_store() {
    let i = Expr::var("i", ScalarType::I32);
    let text = lower(
        Function::new("copy", ScalarType::I32)
            .with_arg(Argument::buffer("dst", ScalarType::F32))
            .with_arg(Argument::buffer("src", ScalarType::F32))
            .with_body(vec![
                Stmt::for_(
                    "i",
                    Expr::int(0),
                    Expr::int(16),
                    vec![Stmt::store(
                        "dst",
                        i.clone(),
                        Expr::load("src", ScalarType::F32, i),
                    )],
                ),
                Stmt::Return(Expr::int(0)),
            ]),
    );
    let expected = "\
define i32 @copy(ptr %dst, ptr %src) {
entry:
  %.t0 = add i32 0, 16
  %i.addr.0 = alloca i32
  store i32 0, ptr %i.addr.0
  br label %loop.header.0
loop.header.0:
  %.t1 = load i32, ptr %i.addr.0
  %.t2 = icmp slt i32 %.t1, %.t0
  br i1 %.t2, label %loop.body.0, label %loop.exit.0
loop.body.0:
  %.t3 = getelementptr inbounds float, ptr %src, i32 %.t1
  %.t4 = load float, ptr %.t3
  %.t5 = getelementptr inbounds float, ptr %dst, i32 %.t1
  store float %.t4, ptr %.t5
  %.t6 = add i32 %.t1, 1
  store i32 %.t6, ptr %i.addr.0
  br label %loop.header.0
loop.exit.0:
  ret i32 0
}
";
    assert_eq!(text, expected);
}

#[test]
fn test_statements_after_return_are_dropped() {
    let text = lower(Function::new("f", ScalarType::I32).with_body(vec![
        Stmt::Return(Expr::int(1)),
        Stmt::Return(Expr::int(2)),
    ]));
    assert!(text.contains("ret i32 1\n"));
    assert!(!text.contains("ret i32 2"));
}

#[test]
fn test_calls_declare_externs_once() {
    let call = Expr::call("sqrtf", ScalarType::F32, vec![Expr::float(2.0)]);
    let module = Module::new("m", target("x86-64-linux"))
        .with_function(Function::new("helper", ScalarType::I32))
        .with_function(Function::new("f", ScalarType::I32).with_body(vec![
            Stmt::Evaluate(call.clone()),
            Stmt::Evaluate(call),
            Stmt::Evaluate(Expr::call("helper", ScalarType::I32, vec![])),
        ]));
    let text = portable_text(&module);
    assert_eq!(text.matches("declare float @sqrtf(float)").count(), 1);
    assert!(!text.contains("declare i32 @helper"));
    assert!(text.contains("call i32 @helper()"));
}

#[test]
fn test_portable_text_header() {
    let module = Module::new("kernel", target("pnacl-32-nacl-no_runtime"));
    let text = portable_text(&module);
    assert_eq!(
        text,
        "; ModuleID = 'kernel'\n\
         source_filename = \"kernel\"\n\
         target triple = \"le32-unknown-nacl\"\n\
         ; kiln target: pnacl-32-nacl-no_runtime\n\
         ; runtime: external\n"
    );
}

#[test]
fn test_emit_portable_assembly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kernel.ll");
    let module = Module::new("kernel", target("x86-64-linux"))
        .with_function(Function::new("f", ScalarType::I32));
    emit_portable_assembly(&module, &path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), portable_text(&module));
}
