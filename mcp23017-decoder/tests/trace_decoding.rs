// End-to-end decoding of trace files and event streams
use mcp23017_decoder::{Bank, BusEvent, DecodedTransaction, Decoder, DecoderConfig, Direction};
use std::io::Write;

/// Builds event sequences with increasing timestamps
struct TraceBuilder {
    now: u64,
    events: Vec<BusEvent>,
}

impl TraceBuilder {
    fn new() -> Self {
        Self { now: 0, events: Vec::new() }
    }

    fn tick(&mut self) -> (u64, u64) {
        let start = self.now;
        self.now += 10;
        (start, start + 5)
    }

    fn start(mut self) -> Self {
        let (start_ns, end_ns) = self.tick();
        self.events.push(BusEvent::Start { start_ns, end_ns });
        self
    }

    fn address(mut self, address: u8, read: bool, ack: bool) -> Self {
        let (start_ns, end_ns) = self.tick();
        self.events.push(BusEvent::Address { start_ns, end_ns, address, read, ack });
        self
    }

    fn data(mut self, bytes: &[u8]) -> Self {
        for &byte in bytes {
            let (start_ns, end_ns) = self.tick();
            self.events.push(BusEvent::Data { start_ns, end_ns, byte });
        }
        self
    }

    fn stop(mut self) -> Self {
        let (start_ns, end_ns) = self.tick();
        self.events.push(BusEvent::Stop { start_ns, end_ns });
        self
    }

    fn write(self, address: u8, bytes: &[u8]) -> Self {
        self.start().address(address, false, true).data(bytes).stop()
    }

    fn read(self, address: u8, bytes: &[u8]) -> Self {
        self.start().address(address, true, true).data(bytes).stop()
    }

    fn build(self) -> Vec<BusEvent> {
        self.events
    }
}

fn strings(record: &DecodedTransaction) -> Vec<String> {
    record.fields.iter().map(|f| f.to_string()).collect()
}

#[test]
fn test_iocon_bank_scenario() {
    let events = TraceBuilder::new()
        .write(0x20, &[0x0a, 0x80])
        .read(0x20, &[0x09, 0x05])
        .build();

    let mut decoder = Decoder::new(DecoderConfig::new());
    let records = decoder.decode_all(&events);

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].direction, Direction::Write);
    assert_eq!(strings(&records[0]), vec!["IOCON=0x80"]);
    assert_eq!(records[1].direction, Direction::Read);
    assert_eq!(strings(&records[1]), vec!["GPIOA=0x05"]);
    assert!(records[0].start_ns <= records[0].end_ns);
}

#[test]
fn test_bank_switch_only_affects_written_chip() {
    let events = TraceBuilder::new()
        .write(0x20, &[0x0a, 0x80])
        .read(0x21, &[0x09, 0x05])
        .read(0x20, &[0x19, 0x06])
        .build();

    let mut decoder = Decoder::new(DecoderConfig::new());
    let records = decoder.decode_all(&events);

    assert_eq!(strings(&records[1]), vec!["INTCONB=0x05"]);
    assert_eq!(strings(&records[2]), vec!["GPIOB=0x06"]);
    assert_eq!(decoder.bank(0x20), Bank::Bank1);
    assert_eq!(decoder.bank(0x21), Bank::Bank0);
}

#[test]
fn test_verbose_iocon_scenario() {
    let events = TraceBuilder::new().write(0x20, &[0x0a, 0x84]).build();

    let mut decoder = Decoder::new(DecoderConfig::new().with_iocon_bits(true));
    let records = decoder.decode_all(&events);

    let fields = strings(&records[0]);
    assert_eq!(fields.len(), 7);
    assert!(fields.contains(&"BANK=True".to_string()));
    assert!(fields.contains(&"ODR=True".to_string()));
    assert_eq!(fields.iter().filter(|f| f.ends_with("=False")).count(), 5);
    assert!(!fields.iter().any(|f| f.starts_with("IOCON")));
}

#[test]
fn test_foreign_chip_never_decodes() {
    let events = TraceBuilder::new()
        .write(0x30, &[0x0a, 0x80])
        .read(0x30, &[0x12, 0x00])
        .build();

    let mut decoder = Decoder::new(DecoderConfig::new());
    assert!(decoder.decode_all(&events).is_empty());
    assert_eq!(decoder.bank(0x30), Bank::Bank0);
}

#[test]
fn test_unacknowledged_address_never_decodes() {
    let events = TraceBuilder::new()
        .start()
        .address(0x20, false, false)
        .data(&[0x0a, 0x80])
        .stop()
        .write(0x20, &[0x12, 0x01])
        .build();

    let mut decoder = Decoder::new(DecoderConfig::new());
    let records = decoder.decode_all(&events);
    assert_eq!(records.len(), 1);
    assert_eq!(strings(&records[0]), vec!["GPIOA=0x01"]);
    assert_eq!(decoder.bank(0x20), Bank::Bank0);
}

#[test]
fn test_field_count_matches_payload() {
    let payload = [0x00, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23];
    let events = TraceBuilder::new().write(0x25, &payload).build();

    let mut decoder = Decoder::new(DecoderConfig::new());
    let records = decoder.decode_all(&events);
    let fields = strings(&records[0]);

    assert_eq!(fields.len(), payload.len() - 1);
    assert_eq!(fields[0], "IODIRA=0x01");
    assert_eq!(fields[21], "OLATB=0x16");
    assert_eq!(fields[22], "0x16?=0x17");
}

#[test]
fn test_repeated_start_read() {
    // Pointer write, repeated start, read phase
    let events = TraceBuilder::new()
        .start()
        .address(0x20, false, true)
        .data(&[0x12])
        .start()
        .address(0x20, true, true)
        .data(&[0xaa, 0x55])
        .stop()
        .build();

    let mut abandon = Decoder::new(DecoderConfig::new());
    let records = abandon.decode_all(&events);
    assert_eq!(records.len(), 1);
    // Only the read phase survives; its first byte is taken as the pointer
    assert_eq!(strings(&records[0]), vec!["0xaa?=0x55"]);

    let mut combine = Decoder::new(DecoderConfig::new().with_combined_repeated_start(true));
    let records = combine.decode_all(&events);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].direction, Direction::Read);
    assert_eq!(records[0].start_ns, 0);
    assert_eq!(strings(&records[0]), vec!["GPIOA=0xaa", "GPIOB=0x55"]);
}

#[test]
fn test_decode_csv_file() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    write!(
        file,
        "name,type,start_time,duration,ack,address,read,data\n\
         I2C,start,0.0,0.000001,,,,\n\
         I2C,address,0.00001,0.00009,true,0x20,false,\n\
         I2C,data,0.0001,0.00009,true,,,0x0a\n\
         I2C,data,0.0002,0.00009,true,,,0x80\n\
         I2C,stop,0.0003,0.000001,,,,\n\
         I2C,start,0.001,0.000001,,,,\n\
         I2C,address,0.00101,0.00009,true,0x20,true,\n\
         I2C,data,0.0011,0.00009,true,,,0x09\n\
         I2C,data,0.0012,0.00009,false,,,0x05\n\
         I2C,stop,0.0013,0.000001,,,,\n"
    )
    .unwrap();

    let mut decoder = Decoder::new(DecoderConfig::new());
    let records: Vec<_> = decoder
        .decode_file(file.path())
        .unwrap()
        .collect::<mcp23017_decoder::Result<_>>()
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].to_string(), "Addr. 0x20: write {IOCON=0x80}");
    assert_eq!(records[1].to_string(), "Addr. 0x20: read {GPIOA=0x05}");
    assert_eq!(records[1].start_ns, 1_000_000);
    assert_eq!(records[1].end_ns, 1_301_000);
}

#[test]
fn test_decode_jsonl_file() {
    let events = TraceBuilder::new()
        .write(0x27, &[0x00, 0xff, 0x00])
        .build();

    let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
    for event in &events {
        writeln!(file, "{}", serde_json::to_string(event).unwrap()).unwrap();
    }
    writeln!(file, "not json").unwrap();

    let mut decoder = Decoder::new(DecoderConfig::new());
    let results: Vec<_> = decoder.decode_file(file.path()).unwrap().collect();

    assert_eq!(results.len(), 2);
    let record = results[0].as_ref().unwrap();
    assert_eq!(record.data_string(), "IODIRA=0xff; IODIRB=0x00");
    assert!(results[1].is_err());
}
