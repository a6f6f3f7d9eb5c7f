use super::{expect_register, run_test, ExpectedState, ALL_REGISTERS};

#[test]
fn load_immediate_into_each_register() {
    for register in ALL_REGISTERS {
        let load_opcode = 0x06 | (register.to_opcode_bits() << 3);

        let mut expected = ExpectedState::empty();
        expect_register(&mut expected, register, 0x7E);

        run_test(&format!("{load_opcode:02X}7E"), &expected);
    }
}

#[test]
fn load_register_to_register() {
    run_test(
        // LD B, 0x3C; LD D, B; LD A, D
        "063C507A",
        &ExpectedState {
            a: Some(0x3C),
            b: Some(0x3C),
            d: Some(0x3C),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_indirect_hl() {
    run_test(
        // LD HL, 0xC0A0; LD (HL), 0x66; LD B, (HL)
        "21A0C0366646",
        &ExpectedState {
            b: Some(0x66),
            h: Some(0xC0),
            l: Some(0xA0),
            memory: [(0xC0A0_u16, 0x66_u8)].into_iter().collect(),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_indirect_bc_de() {
    run_test(
        // LD BC, 0xC111; LD A, 0x42; LD (BC), A; LD DE, 0xC111; LD A, (DE)
        "0111C13E4202 1111C1 1A".replace(' ', "").as_str(),
        &ExpectedState {
            a: Some(0x42),
            memory: [(0xC111_u16, 0x42_u8)].into_iter().collect(),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_hl_increment_and_decrement() {
    run_test(
        // LD HL, 0xC000; LD A, 0x11; LD (HL+), A; LD A, 0x22; LD (HL-), A
        "2100C03E11223E2232",
        &ExpectedState {
            h: Some(0xC0),
            l: Some(0x00),
            memory: [(0xC000_u16, 0x11_u8), (0xC001_u16, 0x22_u8)]
                .into_iter()
                .collect(),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD HL, 0xC001; LD (HL), 0x5A; LD A, (HL-)
        "2101C0365A3A",
        &ExpectedState {
            a: Some(0x5A),
            h: Some(0xC0),
            l: Some(0x00),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_high_page() {
    run_test(
        // LD A, 0x77; LDH (0x80), A; LD A, 0x00; LDH A, (0x80)
        "3E77E0803E00F080",
        &ExpectedState {
            a: Some(0x77),
            memory: [(0xFF80_u16, 0x77_u8)].into_iter().collect(),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD C, 0x81; LD A, 0x12; LD (0xFF00+C), A
        "0E813E12E2",
        &ExpectedState {
            memory: [(0xFF81_u16, 0x12_u8)].into_iter().collect(),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_direct_address() {
    run_test(
        // LD A, 0x9A; LD (0xC000), A; LD A, 0x00; LD A, (0xC000)
        "3E9AEA00C03E00FA00C0",
        &ExpectedState {
            a: Some(0x9A),
            memory: [(0xC000_u16, 0x9A_u8)].into_iter().collect(),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_pair_immediate_and_sp() {
    run_test(
        // LD BC, 0x1234; LD SP, 0xCFFE
        "013412 31FECF".replace(' ', "").as_str(),
        &ExpectedState {
            b: Some(0x12),
            c: Some(0x34),
            sp: Some(0xCFFE),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD HL, 0xABCD; LD SP, HL
        "21CDABF9",
        &ExpectedState {
            sp: Some(0xABCD),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD SP, 0xCFFE; LD (0xC000), SP
        "31FECF0800C0",
        &ExpectedState {
            memory: [(0xC000_u16, 0xFE_u8), (0xC001_u16, 0xCF_u8)]
                .into_iter()
                .collect(),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn push_pop_round_trip() {
    run_test(
        // LD BC, 0x55AA; PUSH BC; POP DE
        "01AA55C5D1",
        &ExpectedState {
            d: Some(0x55),
            e: Some(0xAA),
            sp: Some(0xFFFE),
            memory: [(0xFFFC_u16, 0xAA_u8), (0xFFFD_u16, 0x55_u8)]
                .into_iter()
                .collect(),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn pop_af_zeroes_flag_low_nibble() {
    run_test(
        // LD BC, 0xFFFF; PUSH BC; POP AF
        "01FFFFC5F1",
        &ExpectedState {
            a: Some(0xFF),
            f: Some(0xF0),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn push_af_stores_flags() {
    run_test(
        // LD A, 0x55; SCF; PUSH AF; POP BC
        "3E5537F5C1",
        &ExpectedState {
            b: Some(0x55),
            c: Some(0x10),
            ..ExpectedState::empty()
        },
    );
}
