use crate::{
    compute::Accumulator,
    data::{OutputRow, OUTPUT_HEADER},
};

/// Basic CSV exporter for the merged `Accumulator`. The header is written by hand so
/// it is there even when there is nothing to merge.
pub(crate) fn write_accumulator<W: std::io::Write>(
    writer: W,
    accumulator: &Accumulator,
) -> Result<(), anyhow::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    wtr.write_record(OUTPUT_HEADER)?;
    for entry in accumulator.entries() {
        wtr.serialize(OutputRow::from(entry))?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::write_accumulator;
    use crate::{
        compute::{build_skeleton, Accumulator},
        data::{DateMap, Kind},
        read::CellUser,
    };

    fn write(accumulator: &Accumulator) -> String {
        let mut out = Vec::new();
        write_accumulator(&mut out, accumulator).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn write_merged() {
        let dates = DateMap::parse(&["1/22/20", "1/23/20"]).unwrap();
        let countries = ["Zambia".to_owned(), "Korea, South".to_owned()].into();
        let mut accumulator = Accumulator::skeleton(dates, countries);
        accumulator
            .use_cell(Kind::Confirmed, "1/23/20", "Zambia", 5)
            .unwrap();
        accumulator
            .use_cell(Kind::Recovered, "1/22/20", "Korea, South", 2)
            .unwrap();
        assert_eq!(
            write(&accumulator),
            "\
isodate,country,confirmed,deaths,recovered
2020-01-22,\"Korea, South\",0,0,2
2020-01-22,Zambia,0,0,0
2020-01-23,\"Korea, South\",0,0,0
2020-01-23,Zambia,5,0,0
"
        );
    }

    #[test]
    fn write_header_only() {
        let csv = b"Province/State,Country/Region,Lat,Long,1/22/20\n";
        let accumulator = build_skeleton(&csv[..], Kind::Confirmed).unwrap();
        assert_eq!(
            write(&accumulator),
            "isodate,country,confirmed,deaths,recovered\n"
        );
    }

    #[test]
    fn write_is_stable() {
        let csv = b"\
Province/State,Country/Region,Lat,Long,1/22/20,1/23/20
,Zambia,0,0,1,2
,Afghanistan,0,0,3,4
";
        let accumulator = build_skeleton(&csv[..], Kind::Confirmed).unwrap();
        let first = write(&accumulator);
        assert_eq!(first, write(&accumulator));
        assert_eq!(first.lines().count(), 2 * 2 + 1);
        assert!(first.find("Afghanistan") < first.find("Zambia"));
    }
}
