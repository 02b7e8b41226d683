use pli_impact::domain::impact::impacted_by;
use pli_impact::domain::snapshot::SourceFile;
use pli_impact::infrastructure::LexicalCallGraphBuilder;
use pli_impact::ports::CallGraphBuilder;

#[test]
fn nodes_span_files_without_namespacing() {
    // Build an in-memory set of source files across two modules
    let payroll = r#"
        PAYROLL: PROC OPTIONS(MAIN);
            CALL CALC_TAX;
            CALL PRINT_SLIP;
        END PAYROLL;
    "#;
    let tax = r#"
        CALC_TAX: PROC;
            CALL ROUND_AMT;
        END CALC_TAX;
        ROUND_AMT: PROC;
        END ROUND_AMT;
    "#;

    let sources = vec![
        SourceFile::new("src/payroll.pli", payroll),
        SourceFile::new("src/tax.pli", tax),
    ];

    let (cg, proc_to_file) = LexicalCallGraphBuilder.build_call_graph(&sources);
    let mut ids: Vec<String> = cg.nodes.iter().map(|n| n.id.clone()).collect();
    ids.sort();

    assert_eq!(ids, vec!["CALC_TAX", "PAYROLL", "PRINT_SLIP", "ROUND_AMT"]);
    assert_eq!(proc_to_file["ROUND_AMT"], "src/tax.pli");
    assert!(!proc_to_file.contains_key("PRINT_SLIP"), "PRINT_SLIP is only called");

    let impacted: Vec<String> = impacted_by(&cg, "ROUND_AMT").into_iter().collect();
    assert_eq!(impacted, vec!["CALC_TAX", "PAYROLL"]);
}

#[test]
fn mutual_recursion_across_files_terminates() {
    let sources = vec![
        SourceFile::new("ping.pli", "PING: PROC;\n CALL PONG;\n"),
        SourceFile::new("pong.pli", "PONG: PROC;\n CALL PING;\n"),
        SourceFile::new("driver.pli", "DRIVER: PROC;\n CALL PING;\n"),
    ];

    let (cg, _) = LexicalCallGraphBuilder.build_call_graph(&sources);
    let impacted: Vec<String> = impacted_by(&cg, "PING").into_iter().collect();
    assert_eq!(impacted, vec!["DRIVER", "PONG"]);
}

#[test]
fn file_without_procedures_contributes_nothing() {
    let sources = vec![
        SourceFile::new("notes.pli", "/* nothing declared here */\nCALL STRAY;\n"),
        SourceFile::new("main.pli", "MAIN: PROC;\n"),
    ];

    let (cg, _) = LexicalCallGraphBuilder.build_call_graph(&sources);
    assert_eq!(cg.node_count(), 1);
    assert_eq!(cg.edge_count(), 0);
}
