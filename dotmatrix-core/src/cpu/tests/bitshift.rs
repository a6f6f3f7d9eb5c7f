use super::{run_test, ExpectedState};

#[test]
fn rlca_forces_zero_clear() {
    run_test(
        // LD A, 0x85; RLCA
        "3E8507",
        &ExpectedState {
            a: Some(0x0B),
            f: Some(0x10),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // XOR A; RLCA (result zero, Z still forced off)
        "AF07",
        &ExpectedState {
            a: Some(0x00),
            f: Some(0x00),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn rla_shifts_carry_in() {
    run_test(
        // LD A, 0x80; RLA
        "3E8017",
        &ExpectedState {
            a: Some(0x00),
            f: Some(0x10),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD A, 0x80; SCF; RLA
        "3E803717",
        &ExpectedState {
            a: Some(0x01),
            f: Some(0x10),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn rrca_and_rra() {
    run_test(
        // LD A, 0x01; RRCA
        "3E010F",
        &ExpectedState {
            a: Some(0x80),
            f: Some(0x10),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD A, 0x01; RRA
        "3E011F",
        &ExpectedState {
            a: Some(0x00),
            f: Some(0x10),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD A, 0x02; SCF; RRA
        "3E02371F",
        &ExpectedState {
            a: Some(0x81),
            f: Some(0x00),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn cb_rotates_compute_zero() {
    run_test(
        // LD B, 0x80; RLC B
        "0680CB00",
        &ExpectedState {
            b: Some(0x01),
            f: Some(0x10),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD B, 0x00; RLC B
        "0600CB00",
        &ExpectedState {
            b: Some(0x00),
            f: Some(0x80),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD C, 0x01; RR C
        "0E01CB19",
        &ExpectedState {
            c: Some(0x00),
            f: Some(0x90),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn shifts() {
    run_test(
        // LD A, 0x81; SLA A
        "3E81CB27",
        &ExpectedState {
            a: Some(0x02),
            f: Some(0x10),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD A, 0x82; SRA A (sign bit preserved)
        "3E82CB2F",
        &ExpectedState {
            a: Some(0xC1),
            f: Some(0x00),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD A, 0x01; SRL A
        "3E01CB3F",
        &ExpectedState {
            a: Some(0x00),
            f: Some(0x90),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn shift_indirect_hl() {
    run_test(
        // LD HL, 0xCDA4; LD (HL), 0x81; SLA (HL)
        "21A4CD3681CB26",
        &ExpectedState {
            f: Some(0x10),
            memory: [(0xCDA4_u16, 0x02_u8)].into_iter().collect(),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn swap_nibbles() {
    run_test(
        // LD A, 0xF1; SWAP A
        "3EF1CB37",
        &ExpectedState {
            a: Some(0x1F),
            f: Some(0x00),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // XOR A; SWAP A
        "AFCB37",
        &ExpectedState {
            a: Some(0x00),
            f: Some(0x80),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn bit_test_reads_the_named_bit() {
    run_test(
        // LD B, 0x04; BIT 2, B
        "0604CB50",
        &ExpectedState {
            f: Some(0x20),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD B, 0x00; BIT 2, B
        "0600CB50",
        &ExpectedState {
            f: Some(0xA0),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // SCF; LD B, 0x80; BIT 7, B (carry untouched)
        "370680CB78",
        &ExpectedState {
            f: Some(0x30),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn set_and_reset_bits() {
    run_test(
        // LD B, 0x00; SET 0, B
        "0600CBC0",
        &ExpectedState {
            b: Some(0x01),
            f: Some(0x00),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD B, 0xFF; RES 0, B
        "06FFCB80",
        &ExpectedState {
            b: Some(0xFE),
            f: Some(0x00),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD HL, 0xC400; LD (HL), 0x00; SET 7, (HL)
        "2100C43600CBFE",
        &ExpectedState {
            memory: [(0xC400_u16, 0x80_u8)].into_iter().collect(),
            ..ExpectedState::empty()
        },
    );
}
