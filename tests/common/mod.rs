//! Minimal Hack CPU emulator for executing translator output in tests.
//!
//! Accepts the assembly text the translator emits, resolves labels and
//! variables the way the Hack assembler does, and runs it against 32K words
//! of RAM.

#![allow(dead_code)]

use std::collections::HashMap;

use phf::phf_map;

pub const RAM_SIZE: usize = 32768;

pub const SP: usize = 0;
pub const LCL: usize = 1;
pub const ARG: usize = 2;
pub const THIS: usize = 3;
pub const THAT: usize = 4;

static PREDEFINED: phf::Map<&'static str, u16> = phf_map! {
    "R0" => 0, "R1" => 1, "R2" => 2, "R3" => 3,
    "R4" => 4, "R5" => 5, "R6" => 6, "R7" => 7,
    "R8" => 8, "R9" => 9, "R10" => 10, "R11" => 11,
    "R12" => 12, "R13" => 13, "R14" => 14, "R15" => 15,
    "SP" => 0, "LCL" => 1, "ARG" => 2, "THIS" => 3, "THAT" => 4,
    "SCREEN" => 16384, "KBD" => 24576,
};

#[derive(Debug, Clone, Copy, Default)]
struct Dest {
    a: bool,
    d: bool,
    m: bool,
}

#[derive(Debug, Clone)]
enum Op {
    Load(u16),
    Compute {
        dest: Dest,
        comp: String,
        jump: String,
    },
}

pub struct Cpu {
    pub ram: Vec<i16>,
    pub a: i16,
    pub d: i16,
    pub pc: usize,
    rom: Vec<Op>,
    labels: HashMap<String, usize>,
    variables: HashMap<String, u16>,
}

impl Cpu {
    /// Assemble and load a program. Panics on malformed assembly.
    pub fn load(asm: &str) -> Self {
        let lines: Vec<&str> = asm
            .lines()
            .map(|l| l.split("//").next().unwrap_or("").trim())
            .filter(|l| !l.is_empty())
            .collect();

        // First pass: labels
        let mut labels = HashMap::new();
        let mut addr = 0;
        for line in &lines {
            if let Some(label) = line.strip_prefix('(').and_then(|l| l.strip_suffix(')')) {
                let previous = labels.insert(label.to_string(), addr);
                assert!(previous.is_none(), "duplicate label ({label})");
            } else {
                addr += 1;
            }
        }

        // Second pass: instructions and variables
        let mut variables = HashMap::new();
        let mut next_var = 16u16;
        let mut rom = Vec::with_capacity(addr);
        for line in &lines {
            if line.starts_with('(') {
                continue;
            }
            if let Some(value) = line.strip_prefix('@') {
                let word = if let Ok(n) = value.parse::<u16>() {
                    assert!(n <= 32767, "literal out of range: {line}");
                    n
                } else if let Some(&n) = PREDEFINED.get(value) {
                    n
                } else if let Some(&n) = labels.get(value) {
                    n as u16
                } else {
                    *variables.entry(value.to_string()).or_insert_with(|| {
                        let n = next_var;
                        next_var += 1;
                        n
                    })
                };
                rom.push(Op::Load(word));
            } else {
                rom.push(parse_compute(line));
            }
        }

        Self {
            ram: vec![0; RAM_SIZE],
            a: 0,
            d: 0,
            pc: 0,
            rom,
            labels,
            variables,
        }
    }

    /// ROM address of a label. Panics if undefined.
    pub fn label(&self, name: &str) -> usize {
        *self
            .labels
            .get(name)
            .unwrap_or_else(|| panic!("undefined label {name}"))
    }

    /// RAM address assigned to a variable symbol. Panics if unused.
    pub fn variable(&self, name: &str) -> usize {
        *self
            .variables
            .get(name)
            .unwrap_or_else(|| panic!("unknown variable {name}")) as usize
    }

    pub fn sp(&self) -> usize {
        self.ram[SP] as usize
    }

    pub fn stack_top(&self) -> i16 {
        self.ram[self.sp() - 1]
    }

    pub fn rom_len(&self) -> usize {
        self.rom.len()
    }

    /// Execute one instruction.
    pub fn step(&mut self) {
        let op = self.rom[self.pc].clone();
        match op {
            Op::Load(n) => {
                self.a = n as i16;
                self.pc += 1;
            }
            Op::Compute { dest, comp, jump } => {
                let addr = self.a as u16 as usize;
                let value = self.eval(&comp, addr);

                if dest.m {
                    assert!(addr < RAM_SIZE, "write outside RAM at {addr}");
                    self.ram[addr] = value;
                }
                if dest.a {
                    self.a = value;
                }
                if dest.d {
                    self.d = value;
                }

                let taken = match jump.as_str() {
                    "" => false,
                    "JGT" => value > 0,
                    "JEQ" => value == 0,
                    "JGE" => value >= 0,
                    "JLT" => value < 0,
                    "JNE" => value != 0,
                    "JLE" => value <= 0,
                    "JMP" => true,
                    other => panic!("bad jump {other}"),
                };
                self.pc = if taken { addr } else { self.pc + 1 };
            }
        }
    }

    /// Run until the program counter falls off the end of ROM.
    pub fn run_to_end(&mut self, max_steps: usize) -> usize {
        for steps in 0..max_steps {
            if self.pc >= self.rom.len() {
                return steps;
            }
            self.step();
        }
        panic!("program did not finish within {max_steps} steps");
    }

    /// Run until the program counter reaches `target`.
    pub fn run_until(&mut self, target: usize, max_steps: usize) -> usize {
        for steps in 0..max_steps {
            if self.pc == target {
                return steps;
            }
            assert!(self.pc < self.rom.len(), "ran off the end of ROM");
            self.step();
        }
        panic!("pc {target} not reached within {max_steps} steps");
    }

    /// Run until the program counter reaches the given label.
    pub fn run_until_label(&mut self, label: &str, max_steps: usize) -> usize {
        let target = self.label(label);
        self.run_until(target, max_steps)
    }

    fn eval(&self, comp: &str, addr: usize) -> i16 {
        let x = self.d;
        let y = if comp.contains('M') {
            assert!(addr < RAM_SIZE, "read outside RAM at {addr}");
            self.ram[addr]
        } else {
            self.a
        };

        match comp.replace('M', "A").as_str() {
            "0" => 0,
            "1" => 1,
            "-1" => -1,
            "D" => x,
            "A" => y,
            "!D" => !x,
            "!A" => !y,
            "-D" => x.wrapping_neg(),
            "-A" => y.wrapping_neg(),
            "D+1" => x.wrapping_add(1),
            "A+1" => y.wrapping_add(1),
            "D-1" => x.wrapping_sub(1),
            "A-1" => y.wrapping_sub(1),
            "D+A" | "A+D" => x.wrapping_add(y),
            "D-A" => x.wrapping_sub(y),
            "A-D" => y.wrapping_sub(x),
            "D&A" | "A&D" => x & y,
            "D|A" | "A|D" => x | y,
            other => panic!("bad comp {other}"),
        }
    }
}

fn parse_compute(line: &str) -> Op {
    let (dest_str, rest) = match line.split_once('=') {
        Some((dest, rest)) => (dest, rest),
        None => ("", line),
    };
    let (comp, jump) = match rest.split_once(';') {
        Some((comp, jump)) => (comp, jump),
        None => (rest, ""),
    };

    let mut dest = Dest::default();
    for c in dest_str.chars() {
        match c {
            'A' => dest.a = true,
            'D' => dest.d = true,
            'M' => dest.m = true,
            other => panic!("bad dest {other} in {line}"),
        }
    }

    Op::Compute {
        dest,
        comp: comp.to_string(),
        jump: jump.to_string(),
    }
}

/// Load `asm`, apply RAM presets, and return the CPU ready to run.
pub fn boot(asm: &str, presets: &[(usize, i16)]) -> Cpu {
    let mut cpu = Cpu::load(asm);
    for &(addr, value) in presets {
        cpu.ram[addr] = value;
    }
    cpu
}

/// Labels defined in `asm`, in order of definition.
pub fn defined_labels(asm: &str) -> Vec<&str> {
    asm.lines()
        .filter_map(|l| l.strip_prefix('(').and_then(|l| l.strip_suffix(')')))
        .collect()
}
