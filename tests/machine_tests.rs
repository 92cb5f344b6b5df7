use std::io::{self, Read};
use std::sync::mpsc::{self, Receiver};
use std::thread;

use lace_vm::device::{BufferedInput, StreamInput};
use lace_vm::image::load_image;
use lace_vm::{Flag, Memory, Register, RunError, RunState, Status, KBDR, KBSR};

fn image(words: &[u16]) -> Vec<u8> {
    words.iter().flat_map(|word| word.to_be_bytes()).collect()
}

fn boot(words: &[u16], input: &str) -> RunState<BufferedInput, Vec<u8>> {
    let mut mem = Memory::new();
    load_image(image(words).as_slice(), &mut mem).unwrap();
    RunState::new(mem, BufferedInput::new(input), Vec::new())
}

#[test]
fn add_then_halt() {
    // ADD R0, R0, #5 ; HALT
    let mut state = boot(&[0x3000, 0x1025, 0xf025], "");
    assert_eq!(state.run().unwrap(), 2);
    assert_eq!(state.status(), Status::Halted);
    assert_eq!(state.registers().get(Register::R0), 5);
    assert_eq!(state.registers().flag(), Flag::P);
}

#[test]
fn reserved_opcode_is_introspectable() {
    let mut state = boot(&[0x3000, 0xd000], "");
    state.memory_mut().write(0x4000, 0x1234);

    let err = state.run().unwrap_err();
    assert!(
        matches!(err, RunError::IllegalInstruction { instr: 0xd000, pc: 0x3000 }),
        "{err:?}"
    );
    assert_eq!(state.status(), Status::Faulted);
    assert_eq!(state.registers().pc(), 0x3001);
    assert_eq!(state.registers().flag(), Flag::Z);
    assert_eq!(state.memory().get(0x4000), 0x1234);
    assert_eq!(state.memory().get(0x3000), 0xd000);
}

#[test]
fn counts_down_loop() {
    // AND R0, R0, #0
    // ADD R0, R0, #10
    // ADD R1, R1, #3   <- loop
    // ADD R0, R0, #-1
    // BRp #-3
    // HALT
    let mut state = boot(&[0x3000, 0x5020, 0x102a, 0x1263, 0x103f, 0x03fd, 0xf025], "");
    state.run().unwrap();
    assert_eq!(state.registers().get(Register::R0), 0);
    assert_eq!(state.registers().get(Register::R1), 30);
    assert_eq!(state.registers().flag(), Flag::Z);
    assert_eq!(state.cycles(), 2 + 3 * 10 + 1);
}

#[test]
fn subroutine_call_and_return() {
    // 0x3000 JSR #2
    // 0x3001 HALT
    // 0x3002 .fill 0
    // 0x3003 ADD R2, R2, #7
    // 0x3004 RET
    let mut state = boot(&[0x3000, 0x4802, 0xf025, 0x0000, 0x14a7, 0xc1c0], "");
    state.run().unwrap();
    assert_eq!(state.registers().get(Register::R2), 7);
    assert_eq!(state.registers().get(Register::R7), 0x3001);
    assert_eq!(state.registers().pc(), 0x3002);
}

#[test]
fn store_wraps_to_start_of_memory() {
    // 0x3000 STR R0, R2, #0
    // 0x3001 LDR R1, R2, #1
    // 0x3002 HALT
    let mut state = boot(&[0x3000, 0x7080, 0x6281, 0xf025], "");
    state.registers_mut().set(Register::R0, 0xaaaa);
    state.registers_mut().set(Register::R2, 0xffff);
    state.memory_mut().write(0x0000, 0x0bbb);
    state.run().unwrap();
    assert_eq!(state.memory().get(0xffff), 0xaaaa);
    assert_eq!(state.registers().get(Register::R1), 0x0bbb);
}

#[test]
fn polls_keyboard_until_ready() {
    // 0x3000 LDI R1, #4   ; KBSR
    // 0x3001 BRzp #-2
    // 0x3002 LDI R0, #3   ; KBDR
    // 0x3003 OUT
    // 0x3004 HALT
    // 0x3005 KBSR
    // 0x3006 KBDR
    let mut state = boot(
        &[0x3000, 0xa204, 0x07fe, 0xa003, 0xf021, 0xf025, KBSR, KBDR],
        "!",
    );
    state.run().unwrap();
    assert_eq!(state.output(), b"!");
    assert_eq!(state.input().remaining(), 0);
}

#[test]
fn independent_machines_in_threads() {
    let handles: Vec<_> = (0..4u16)
        .map(|i| {
            thread::spawn(move || {
                // ADD R0, R0, #i ; HALT
                let mut state = boot(&[0x3000, 0x1020 | i, 0xf025], "");
                state.run().unwrap();
                state.registers().get(Register::R0)
            })
        })
        .collect();
    let results: Vec<u16> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results, vec![0, 1, 2, 3]);
}

/// Stream that stays open without producing anything, like an idle pipe.
struct Idle(Receiver<()>);

impl Read for Idle {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        let _ = self.0.recv();
        Ok(0)
    }
}

#[test]
fn keyboard_poll_on_idle_stream_does_not_wait() {
    // 0x3000 LDI R1, #1   ; KBSR
    // 0x3001 HALT
    // 0x3002 KBSR
    let mut mem = Memory::new();
    load_image(image(&[0x3000, 0xa201, 0xf025, KBSR]).as_slice(), &mut mem).unwrap();
    let (_open, idle) = mpsc::channel();
    let mut state = RunState::new(mem, StreamInput::spawn(Idle(idle)), Vec::new());

    assert_eq!(state.run().unwrap(), 2);
    assert_eq!(state.status(), Status::Halted);
    assert_eq!(state.registers().get(Register::R1), 0);
    assert_eq!(state.registers().flag(), Flag::Z);
}
