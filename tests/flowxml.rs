use flowlang::generator::{FlowLangGenerator, Generator, MermaidGenerator};
use flowlang::lexer::Lexer;
use flowlang::{interpreter, parser, xml};

const MID_TEST_CHART: &str = concat!(
    "<FlowChart ",
    "xmlns=\"http://schemas.datacontract.org/2004/07/RAPTOR_Avalonia_MVVM.ViewModels\" ",
    "xmlns:i=\"http://www.w3.org/2001/XMLSchema-instance\" ",
    "xmlns:a=\"http://schemas.datacontract.org/2004/07/raptor\">",
    "<a:Start>",
    "<a:_Successor i:type=\"a:Loop\">",
    "<a:_text_str>x = 10</a:_text_str>",
    "<a:_before_Child i:nil=\"true\"/>",
    "<a:_after_Child i:type=\"a:Rectangle\">",
    "<a:_text_str>x := x + 1</a:_text_str>",
    "</a:_after_Child>",
    "</a:_Successor>",
    "</a:Start>",
    "</FlowChart>",
);

#[test]
fn chart_to_flowlang_text() {
    let program = xml::parse(MID_TEST_CHART).expect("translation should succeed");
    let generated = FlowLangGenerator
        .generate(&program)
        .expect("generation should succeed");

    let expected = "\
LOOP
  IF (x == 10) THEN
    BREAK
  ENDIF
  x := (x + 1)
ENDLOOP";
    assert_eq!(expected, generated);
}

#[test]
fn chart_round_trips_through_flowlang() {
    let program = xml::parse(MID_TEST_CHART).expect("translation should succeed");
    let generated = FlowLangGenerator
        .generate(&program)
        .expect("generation should succeed");

    let tokens = Lexer::new(&generated).lex().expect("lexing should succeed");
    let reparsed = parser::parse(&mut tokens.into()).expect("parsing should succeed");

    assert_eq!(program, reparsed);
}

#[test]
fn chart_renders_as_mid_test_diagram() {
    let program = xml::parse(MID_TEST_CHART).expect("translation should succeed");
    let chart = MermaidGenerator
        .generate(&program)
        .expect("generation should succeed");

    // one decision carrying the exit condition, True out of the loop,
    // False through the increment and back around
    assert!(chart.contains("N1{\"(x == 10)\"}"));
    assert!(chart.contains("N1 --\"True\"--> N2"));
    assert!(chart.contains("N1 --\"False\"--> N3"));
    assert!(chart.contains("N3 --> N1"));
    assert_eq!(1, chart.matches('{').count());
}

#[test]
fn translated_chart_executes() {
    let program = xml::parse(MID_TEST_CHART).expect("translation should succeed");
    let generated = FlowLangGenerator
        .generate(&program)
        .expect("generation should succeed");

    let source = format!("x := 0\n{generated}\nOUTPUT x\n");
    let mut outputs = vec![];
    let memory = interpreter::run_source(
        &source,
        |_prompt| String::new(),
        |value| outputs.push(value.clone()),
    )
    .expect("program should run");

    use flowlang::parser::ast::Value;
    assert_eq!(vec![Value::Integer(10)], outputs);
    assert_eq!(Some(&Value::Integer(10)), memory.get("x"));
}
