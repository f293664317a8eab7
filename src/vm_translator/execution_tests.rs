//! Behavioural tests: translate VM code, assemble it, and run it on the Hack emulator.
//!
//! Programs without a bootstrap start from the conventional test harness
//! state below (SP=256, LCL=300, ARG=400, THIS=3000, THAT=3010).

#[cfg(test)]
mod tests {
    use crate::hack::{assemble, Cpu, Program, StopReason};
    use crate::vm_translator::{TranslationUnit, TranslatorConfig, TranslatorError, VmTranslator};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashSet;
    use test_log::test;

    const SP: u16 = 0;
    const LCL: u16 = 1;
    const ARG: u16 = 2;
    const THIS: u16 = 3;
    const THAT: u16 = 4;

    const STACK_BASE: u16 = 256;
    const LCL_BASE: u16 = 300;
    const ARG_BASE: u16 = 400;
    const THIS_BASE: u16 = 3000;
    const THAT_BASE: u16 = 3010;

    const MAX_CYCLES: u64 = 1_000_000;
    const TRUE: u16 = 0xFFFF;

    fn quiet_translator() -> VmTranslator {
        VmTranslator::new(TranslatorConfig {
            emit_comments: false,
            ..TranslatorConfig::default()
        })
    }

    fn build(units: &[TranslationUnit], entry: Option<&str>) -> (Cpu, Program) {
        let translation = VmTranslator::default()
            .translate(units, entry)
            .expect("translation failed");
        let program = assemble(&translation.instructions).expect("assembly failed");
        (Cpu::new(&program), program)
    }

    fn with_harness_pointers(cpu: &mut Cpu) {
        cpu.poke(SP, STACK_BASE);
        cpu.poke(LCL, LCL_BASE);
        cpu.poke(ARG, ARG_BASE);
        cpu.poke(THIS, THIS_BASE);
        cpu.poke(THAT, THAT_BASE);
    }

    /// Run one unit from the harness state until it falls off the end of ROM
    fn run_unit(lines: &[&str]) -> (Cpu, Program) {
        let (mut cpu, program) = build(&[TranslationUnit::from_lines("Main", lines)], None);
        with_harness_pointers(&mut cpu);
        let report = cpu.run(MAX_CYCLES);
        assert_eq!(report.stop, StopReason::RanOffEnd, "program did not finish");
        (cpu, program)
    }

    /// Run a bootstrapped program until it parks in a halt loop
    fn run_program(units: &[TranslationUnit], entry: &str) -> (Cpu, Program) {
        let (mut cpu, program) = build(units, Some(entry));
        let report = cpu.run(MAX_CYCLES);
        assert!(
            matches!(report.stop, StopReason::Halted(_)),
            "program did not halt: {:?}",
            report
        );
        (cpu, program)
    }

    /// RAM address of `segment index` under the harness pointers
    fn cell_address(program: &Program, segment: &str, index: u16) -> u16 {
        match segment {
            "local" => LCL_BASE + index,
            "argument" => ARG_BASE + index,
            "this" => THIS_BASE + index,
            "that" => THAT_BASE + index,
            "temp" => 5 + index,
            "pointer" => 3 + index,
            "static" => program
                .symbol(&format!("Main.{}", index))
                .expect("static symbol not allocated"),
            other => panic!("no cell for segment {}", other),
        }
    }

    #[test]
    fn test_add_then_pop_local() {
        let (cpu, _) = run_unit(&["push constant 7", "push constant 8", "add", "pop local 0"]);
        assert_eq!(cpu.peek(LCL_BASE), 15);
        assert_eq!(cpu.peek(SP), STACK_BASE);
    }

    #[test]
    fn test_largest_loadable_constant() {
        let (cpu, _) = run_unit(&["push constant 32767", "push constant 1", "add"]);
        // 32767 + 1 wraps to the most negative value
        assert_eq!(cpu.peek(STACK_BASE), 0x8000);
        assert_eq!(cpu.peek_signed(STACK_BASE), i16::MIN);
    }

    #[test]
    fn test_equal_constants_compare_true() {
        let (cpu, _) = run_unit(&["push constant 5", "push constant 5", "eq"]);
        assert_eq!(cpu.peek(STACK_BASE), TRUE);
        assert_eq!(cpu.peek(SP), STACK_BASE + 1);
    }

    #[test]
    fn test_comparisons_on_equal_operands() {
        for (op, expected) in [("eq", TRUE), ("gt", 0), ("lt", 0)] {
            let (cpu, _) = run_unit(&["push constant 9", "push constant 9", op]);
            assert_eq!(cpu.peek(STACK_BASE), expected, "{} on equal operands", op);
        }
    }

    #[test]
    fn test_comparisons_on_ordered_operands() {
        let cases = [
            ("push constant 3", "push constant 7", "lt", TRUE),
            ("push constant 3", "push constant 7", "gt", 0),
            ("push constant 7", "push constant 3", "gt", TRUE),
            ("push constant 7", "push constant 3", "eq", 0),
        ];
        for (x, y, op, expected) in cases {
            let (cpu, _) = run_unit(&[x, y, op]);
            assert_eq!(cpu.peek(STACK_BASE), expected, "{} / {} / {}", x, y, op);
        }
    }

    #[test]
    fn test_repeated_comparisons_in_one_unit() {
        let (cpu, program) = run_unit(&[
            "push constant 1",
            "push constant 1",
            "eq",
            "push constant 2",
            "push constant 1",
            "eq",
        ]);
        assert_eq!(cpu.peek(STACK_BASE), TRUE);
        assert_eq!(cpu.peek(STACK_BASE + 1), 0);
        assert_ne!(program.symbol("EQ_0_TRUE"), program.symbol("EQ_1_TRUE"));
    }

    #[test]
    fn test_arithmetic_and_logic() {
        let (cpu, _) = run_unit(&[
            "push constant 10",
            "push constant 3",
            "sub", // 7
            "neg", // -7
            "push constant 12",
            "push constant 10",
            "and", // 8
            "push constant 12",
            "push constant 3",
            "or", // 15
            "push constant 0",
            "not", // -1
        ]);
        assert_eq!(cpu.peek_signed(STACK_BASE), -7);
        assert_eq!(cpu.peek(STACK_BASE + 1), 8);
        assert_eq!(cpu.peek(STACK_BASE + 2), 15);
        assert_eq!(cpu.peek(STACK_BASE + 3), TRUE);
        assert_eq!(cpu.peek(SP), STACK_BASE + 4);
    }

    #[test]
    fn test_push_constant_then_pop_stores_value() {
        let segments: [(&str, u16); 7] = [
            ("local", 10),
            ("argument", 10),
            ("this", 8),
            ("that", 8),
            ("temp", 8),
            ("pointer", 2),
            ("static", 20),
        ];
        let mut rng = StdRng::seed_from_u64(0x4841_434b);

        for _ in 0..60 {
            let (segment, range) = segments[rng.gen_range(0..segments.len())];
            let index = rng.gen_range(0..range);
            // A-instructions carry 15-bit constants
            let value: u16 = rng.gen_range(0..32768);

            let push = format!("push constant {}", value);
            let pop = format!("pop {} {}", segment, index);
            let (cpu, program) = run_unit(&[push.as_str(), pop.as_str()]);

            let address = cell_address(&program, segment, index);
            assert_eq!(cpu.peek(address), value, "{} then {}", push, pop);
            assert_eq!(cpu.peek(SP), STACK_BASE, "{} then {}", push, pop);
        }
    }

    #[test]
    fn test_push_then_pop_same_cell_is_identity() {
        let segments = ["local", "argument", "this", "that", "temp", "static"];
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..30 {
            let segment = segments[rng.gen_range(0..segments.len())];
            let index: u16 = rng.gen_range(0..6);
            let value: u16 = rng.gen();

            let push = format!("push {} {}", segment, index);
            let pop = format!("pop {} {}", segment, index);
            let (mut cpu, program) =
                build(&[TranslationUnit::from_lines("Main", &[&push, &pop])], None);
            with_harness_pointers(&mut cpu);
            let address = cell_address(&program, segment, index);
            cpu.poke(address, value);

            assert_eq!(cpu.run(MAX_CYCLES).stop, StopReason::RanOffEnd);
            assert_eq!(cpu.peek(address), value, "{} / {}", push, pop);
            assert_eq!(cpu.peek(SP), STACK_BASE);
        }
    }

    #[test]
    fn test_pointer_redirects_this_and_that() {
        let (cpu, _) = run_unit(&[
            "push constant 5000",
            "pop pointer 0",
            "push constant 6000",
            "pop pointer 1",
            "push constant 11",
            "pop this 2",
            "push constant 22",
            "pop that 3",
        ]);
        assert_eq!(cpu.peek(THIS), 5000);
        assert_eq!(cpu.peek(THAT), 6000);
        assert_eq!(cpu.peek(5002), 11);
        assert_eq!(cpu.peek(6003), 22);
    }

    #[test]
    fn test_if_goto_loop_sums_to_n() {
        // sum = 0; n = 5; while n != 0 { sum += n; n -= 1 }
        let (cpu, _) = run_unit(&[
            "push constant 0",
            "pop local 0",
            "push constant 5",
            "pop local 1",
            "label LOOP",
            "push local 0",
            "push local 1",
            "add",
            "pop local 0",
            "push local 1",
            "push constant 1",
            "sub",
            "pop local 1",
            "push local 1",
            "if-goto LOOP",
        ]);
        assert_eq!(cpu.peek(LCL_BASE), 15);
        assert_eq!(cpu.peek(LCL_BASE + 1), 0);
        assert_eq!(cpu.peek(SP), STACK_BASE);
    }

    #[test]
    fn test_call_and_return_restore_caller_frame() {
        let caller = TranslationUnit::from_lines(
            "Main",
            &["call Lib.zero 0", "label HALT", "goto HALT"],
        );
        let callee = TranslationUnit::from_lines(
            "Lib",
            &["function Lib.zero 0", "push constant 0", "return"],
        );
        let translation = quiet_translator()
            .translate(&[caller, callee], None)
            .unwrap();
        let program = assemble(&translation.instructions).unwrap();
        let mut cpu = Cpu::new(&program);
        with_harness_pointers(&mut cpu);
        cpu.poke(STACK_BASE, 0xBEEF);

        let report = cpu.run(MAX_CYCLES);
        assert!(matches!(report.stop, StopReason::Halted(_)), "{:?}", report);
        assert_eq!(cpu.peek(SP), STACK_BASE + 1);
        assert_eq!(cpu.peek(STACK_BASE), 0);
        assert_eq!(cpu.peek(LCL), LCL_BASE);
        assert_eq!(cpu.peek(ARG), ARG_BASE);
        assert_eq!(cpu.peek(THIS), THIS_BASE);
        assert_eq!(cpu.peek(THAT), THAT_BASE);
    }

    #[test]
    fn test_bootstrap_frame() {
        let sys = TranslationUnit::from_lines(
            "Sys",
            &["function Sys.init 0", "label HALT", "goto HALT"],
        );
        let (cpu, program) = run_program(&[sys], "Sys.init");
        assert_eq!(cpu.peek(SP), STACK_BASE + 5);
        assert_eq!(cpu.peek(LCL), STACK_BASE + 5);
        assert_eq!(cpu.peek(ARG), STACK_BASE);
        assert_eq!(cpu.peek(STACK_BASE), program.symbol("OS$ret.0").unwrap());
        assert_eq!(Some(cpu.pc), program.symbol("Sys.init$HALT"));
    }

    #[test]
    fn test_entry_function_return_lands_in_halt_loop() {
        let sys = TranslationUnit::from_lines(
            "Sys",
            &["function Sys.init 0", "push constant 42", "return"],
        );
        let (cpu, program) = run_program(&[sys], "Sys.init");
        assert_eq!(Some(cpu.pc), program.symbol("OS$halt"));
        assert_eq!(cpu.peek(STACK_BASE), 42);
        assert_eq!(cpu.peek(SP), STACK_BASE + 1);
    }

    #[test]
    fn test_cross_unit_call_with_arguments() {
        // Unit B calls a function declared in unit A
        let a = TranslationUnit::from_lines(
            "A",
            &[
                "function A.diff 1",
                "push argument 0",
                "push argument 1",
                "sub",
                "pop local 0",
                "push local 0",
                "return",
            ],
        );
        let b = TranslationUnit::from_lines(
            "B",
            &[
                "function B.main 0",
                "push constant 10",
                "push constant 3",
                "call A.diff 2",
                "pop static 0",
                "push constant 100",
                "push constant 1",
                "call A.diff 2",
                "pop static 1",
                "label END",
                "goto END",
            ],
        );

        let translation = VmTranslator::default()
            .translate(&[a.clone(), b.clone()], Some("B.main"))
            .unwrap();
        let mut seen = HashSet::new();
        for instruction in &translation.instructions {
            if let crate::vm_translator::Instruction::Label(name) = instruction {
                assert!(seen.insert(name.clone()), "duplicate label {}", name);
            }
        }
        assert!(seen.contains("B.main$ret.1"));
        assert!(seen.contains("B.main$ret.2"));

        let (cpu, program) = run_program(&[a, b], "B.main");
        assert_eq!(cpu.peek(program.symbol("B.0").unwrap()), 7);
        assert_eq!(cpu.peek(program.symbol("B.1").unwrap()), 99);
        // B.main's frame is intact after both calls
        assert_eq!(cpu.peek(SP), STACK_BASE + 5);
        assert_eq!(cpu.peek(ARG), STACK_BASE);
    }

    #[test]
    fn test_static_isolation_between_units() {
        let first = TranslationUnit::from_lines(
            "First",
            &["function First.set 0", "push constant 111", "pop static 0", "push constant 0", "return"],
        );
        let second = TranslationUnit::from_lines(
            "Second",
            &["function Second.set 0", "push constant 222", "pop static 0", "push constant 0", "return"],
        );
        let sys = TranslationUnit::from_lines(
            "Sys",
            &[
                "function Sys.init 0",
                "call First.set 0",
                "call Second.set 0",
                "label HALT",
                "goto HALT",
            ],
        );

        let (cpu, program) = run_program(&[sys, first, second], "Sys.init");
        let first_cell = program.symbol("First.0").unwrap();
        let second_cell = program.symbol("Second.0").unwrap();
        assert_ne!(first_cell, second_cell);
        assert_eq!(cpu.peek(first_cell), 111);
        assert_eq!(cpu.peek(second_cell), 222);
    }

    #[test]
    fn test_recursive_fibonacci() {
        let main = TranslationUnit::from_lines(
            "Main",
            &[
                "// fib(n) = n < 2 ? n : fib(n-2) + fib(n-1)",
                "function Main.fibonacci 0",
                "push argument 0",
                "push constant 2",
                "lt",
                "if-goto IF_TRUE",
                "goto IF_FALSE",
                "label IF_TRUE",
                "push argument 0",
                "return",
                "label IF_FALSE",
                "push argument 0",
                "push constant 2",
                "sub",
                "call Main.fibonacci 1",
                "push argument 0",
                "push constant 1",
                "sub",
                "call Main.fibonacci 1",
                "add",
                "return",
            ],
        );
        let sys = TranslationUnit::from_lines(
            "Sys",
            &[
                "function Sys.init 0",
                "push constant 10",
                "call Main.fibonacci 1",
                "label WHILE",
                "goto WHILE",
            ],
        );

        let (cpu, _) = run_program(&[sys, main], "Sys.init");
        assert_eq!(cpu.peek(SP), STACK_BASE + 6);
        assert_eq!(cpu.peek(STACK_BASE + 5), 55);
    }

    #[test]
    fn test_bad_line_aborts_whole_translation() {
        let good = TranslationUnit::from_lines("Good", &["push constant 1"]);
        let bad = TranslationUnit::from_lines("Bad", &["push constant 1", "", "pop heap 0"]);
        let err = VmTranslator::default()
            .translate(&[good, bad], None)
            .unwrap_err();
        assert_eq!(
            err,
            TranslatorError::InUnit {
                unit: "Bad".to_string(),
                line: 3,
                error: Box::new(TranslatorError::UnknownSegment("heap".to_string())),
            }
        );
        assert_eq!(err.to_string(), "Bad.vm:3: Unknown memory segment 'heap'");
    }
}
