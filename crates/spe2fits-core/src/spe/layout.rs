//! Byte offsets of the 4100-byte WinView header (`WINHEAD`).

use crate::io::field::FieldType;
use crate::io::field::FieldType::{Ascii, F32, F64, I16, I32, U16, U32, U8};

/// Length of the fixed binary header; pixel data starts right after it.
pub const HEADER_SIZE: usize = 4100;

pub const EXP_SEC: usize = 10;
pub const DATE: usize = 20;
pub const DATE_LEN: usize = 10;
pub const DET_TEMPERATURE: usize = 36;
pub const XDIM: usize = 42;
pub const DATATYPE: usize = 108;
pub const EXPERIMENT_TIME_LOCAL: usize = 172;
pub const EXPERIMENT_TIME_UTC: usize = 179;
pub const TIME_LEN: usize = 7;
pub const GAIN: usize = 198;
pub const COMMENTS: usize = 200;
pub const COMMENT_LEN: usize = 80;
pub const COMMENT_COUNT: usize = 5;
pub const YDIM: usize = 656;
pub const READOUT_TIME: usize = 672;
/// Version 3 only: absolute offset of the XML footer.
pub const XML_OFFSET: usize = 678;
pub const NUM_FRAMES: usize = 1446;
pub const FILE_HEADER_VER: usize = 1992;
pub const LAST_VALUE: usize = 4098;

/// `lastvalue` is always this when the header was written completely.
pub const LAST_VALUE_MAGIC: i16 = 0x5555;

/// A named field of the legacy header.
#[derive(Clone, Copy, Debug)]
pub struct HeaderField {
    pub name: &'static str,
    pub offset: usize,
    pub field_type: FieldType,
    pub length: usize,
    /// FITS keyword the field is exported under.
    pub keyword: &'static str,
    pub description: &'static str,
}

const fn field(
    name: &'static str,
    offset: usize,
    field_type: FieldType,
    length: usize,
    keyword: &'static str,
    description: &'static str,
) -> HeaderField {
    HeaderField {
        name,
        offset,
        field_type,
        length,
        keyword,
        description,
    }
}

/// Scalar and text fields of `WINHEAD`, in file order.
///
/// Arrays (slit and mirror positions, ROI blocks, calibration structs,
/// `YT_Info`), the comment lines and the spare areas are not listed.
pub const LEGACY_FIELDS: &[HeaderField] = &[
    field("ControllerVersion", 0, I16, 2, "CTRLVER", "Hardware version"),
    field("LogicOutput", 2, I16, 2, "LOGICOUT", "Definition of output BNC"),
    field("AmpHiCapLowNoise", 4, U16, 2, "AMPHICAP", "Amp switching mode"),
    field("xDimDet", 6, U16, 2, "XDIMDET", "Detector x dimension of chip"),
    field("mode", 8, I16, 2, "TIMMODE", "Timing mode"),
    field("exp_sec", EXP_SEC, F32, 4, "EXPOSURE", "Alternative exposure, in sec"),
    field("VChipXdim", 14, I16, 2, "VCHIPX", "Virtual chip x dim"),
    field("VChipYdim", 16, I16, 2, "VCHIPY", "Virtual chip y dim"),
    field("yDimDet", 18, U16, 2, "YDIMDET", "y dimension of CCD or detector"),
    field("date", DATE, Ascii, DATE_LEN, "DATE", "Date as ddmmmyyyy"),
    field("VirtualChipFlag", 30, I16, 2, "VCHIPFLG", "On/Off"),
    field("noscan", 34, I16, 2, "NOSCAN", "Old number of scans, should always be -1"),
    field("DetTemperature", DET_TEMPERATURE, F32, 4, "TEMP", "Detector temperature set"),
    field("DetType", 40, I16, 2, "DETTYPE", "CCD/diode array type"),
    field("xdim", XDIM, U16, 2, "XDIM", "Actual number of pixels on x axis"),
    field("stdiode", 44, I16, 2, "STDIODE", "Trigger diode"),
    field("DelayTime", 46, F32, 4, "DELAYTIM", "Used with async mode"),
    field("ShutterControl", 50, U16, 2, "SHUTCTRL", "Normal, disabled open, disabled closed"),
    field("AbsorbLive", 52, I16, 2, "ABSLIVE", "On/Off"),
    field("AbsorbMode", 54, U16, 2, "ABSMODE", "Reference strip or file"),
    field("CanDoVirtualChipFlag", 56, I16, 2, "CANVCHIP", "Controller able to do virtual chip"),
    field("ThresholdMinLive", 58, I16, 2, "THMINLIV", "On/Off"),
    field("ThresholdMinVal", 60, F32, 4, "THMINVAL", "Threshold minimum value"),
    field("ThresholdMaxLive", 64, I16, 2, "THMAXLIV", "On/Off"),
    field("ThresholdMaxVal", 66, F32, 4, "THMAXVAL", "Threshold maximum value"),
    field("SpecAutoSpectroMode", 70, I16, 2, "SPECAUTO", "T/F spectrograph used"),
    field("SpecCenterWlNm", 72, F32, 4, "SPECCWL", "Center wavelength in nm"),
    field("SpecGlueFlag", 76, I16, 2, "SPGLUE", "T/F file is glued"),
    field("SpecGlueStartWlNm", 78, F32, 4, "SPGLUSTA", "Starting wavelength in nm"),
    field("SpecGlueEndWlNm", 82, F32, 4, "SPGLUEND", "Ending wavelength in nm"),
    field("SpecGlueMinOvrlpNm", 86, F32, 4, "SPGLUOVR", "Minimum overlap in nm"),
    field("SpecGlueFinalResNm", 90, F32, 4, "SPGLURES", "Resolution in nm"),
    field("PulserType", 94, I16, 2, "PULSTYPE", "0=None, PG200=1, PTG=2, DG535=3"),
    field("CustomChipFlag", 96, I16, 2, "CUSTCHIP", "T/F custom chip used"),
    field("XPrePixels", 98, I16, 2, "XPREPIX", "Pre pixels in X direction"),
    field("XPostPixels", 100, I16, 2, "XPOSTPIX", "Post pixels in X direction"),
    field("YPrePixels", 102, I16, 2, "YPREPIX", "Pre pixels in Y direction"),
    field("YPostPixels", 104, I16, 2, "YPOSTPIX", "Post pixels in Y direction"),
    field("asynen", 106, I16, 2, "ASYNEN", "Asynchron enable flag, 0 = off"),
    field("datatype", DATATYPE, I16, 2, "DATATYPE", "Experiment data type"),
    field("PulserMode", 110, I16, 2, "PULSMODE", "Repetitive/Sequential"),
    field("PulserOnChipAccums", 112, U16, 2, "PULSACC", "Num PTG On-Chip Accums"),
    field("PulserRepeatExp", 114, U32, 4, "PULSREP", "Num Exp Repeats (Pulser SW Accum)"),
    field("PulseRepWidth", 118, F32, 4, "PREPWID", "Width value for repetitive pulse (usec)"),
    field("PulseRepDelay", 122, F32, 4, "PREPDLY", "Delay value for repetitive pulse (usec)"),
    field("PulseSeqStartWidth", 126, F32, 4, "PSEQSWID", "Start width for sequential pulse (usec)"),
    field("PulseSeqEndWidth", 130, F32, 4, "PSEQEWID", "End width for sequential pulse (usec)"),
    field("PulseSeqStartDelay", 134, F32, 4, "PSEQSDLY", "Start delay for sequential pulse (usec)"),
    field("PulseSeqEndDelay", 138, F32, 4, "PSEQEDLY", "End delay for sequential pulse (usec)"),
    field("PulseSeqIncMode", 142, I16, 2, "PSEQINC", "Increments: 1=Fixed, 2=Exponential"),
    field("PImaxUsed", 144, I16, 2, "PIMAXUSE", "PI-Max type controller flag"),
    field("PImaxMode", 146, I16, 2, "PIMAXMOD", "PI-Max mode"),
    field("PImaxGain", 148, I16, 2, "PIMAXGAN", "PI-Max Gain"),
    field("BackGrndApplied", 150, I16, 2, "BKGAPPL", "1 if background subtraction done"),
    field("PImax2nsBrdUsed", 152, I16, 2, "PIMAX2NS", "T/F PI-Max 2ns board in use"),
    field("minblk", 154, U16, 2, "MINBLK", "Min. # of strips per skips"),
    field("numminblk", 156, U16, 2, "NUMMINBL", "# of min-blocks before geo skps"),
    field("CustomTimingFlag", 170, I16, 2, "CUSTTIME", "T/F custom timing used"),
    field("ExperimentTimeLocal", EXPERIMENT_TIME_LOCAL, Ascii, TIME_LEN, "EXPTLOC", "Experiment local time as hhmmss"),
    field("ExperimentTimeUTC", EXPERIMENT_TIME_UTC, Ascii, TIME_LEN, "EXPTUTC", "Experiment UTC time as hhmmss"),
    field("ExposUnits", 186, I16, 2, "EXPUNITS", "User units for exposure"),
    field("ADCoffset", 188, U16, 2, "ADCOFFS", "ADC offset"),
    field("ADCrate", 190, U16, 2, "ADCRATE", "ADC rate"),
    field("ADCtype", 192, U16, 2, "ADCTYPE", "ADC type"),
    field("ADCresolution", 194, U16, 2, "ADCRES", "ADC resolution"),
    field("ADCbitAdjust", 196, U16, 2, "ADCBITAD", "ADC bit adjust"),
    field("gain", GAIN, U16, 2, "GAIN", "Gain"),
    field("geometric", 600, U16, 2, "GEOMETRC", "Geometric ops: rotate 0x01, reverse 0x02, flip 0x04"),
    field("xlabel", 602, Ascii, 16, "XLABEL", "Intensity display string"),
    field("cleans", 618, U16, 2, "CLEANS", "Cleans"),
    field("NumSkpPerCln", 620, U16, 2, "SKPPERCL", "Number of skips per clean"),
    field("AutoCleansActive", 642, I16, 2, "AUTOCLN", "T/F auto cleans active"),
    field("UseContCleansInst", 644, I16, 2, "CONTCLNI", "T/F continuous cleans instruction"),
    field("AbsorbStripNum", 646, I16, 2, "ABSSTRIP", "Absorbance strip number"),
    field("SpecSlitPosUnits", 648, I16, 2, "SLITUNIT", "Spectrograph slit position units"),
    field("SpecGrooves", 650, F32, 4, "GROOVES", "Spectrograph grating grooves"),
    field("srccmp", 654, I16, 2, "SRCCMP", "Number of source comp. diodes"),
    field("ydim", YDIM, U16, 2, "YDIM", "y dimension of raw data"),
    field("scramble", 658, I16, 2, "SCRAMBLE", "0 = scrambled, 1 = unscrambled"),
    field("ContinuousCleansFlag", 660, I16, 2, "CONTCLN", "T/F continuous cleans timing option"),
    field("ExternalTriggerFlag", 662, I16, 2, "EXTTRIG", "T/F external trigger timing option"),
    field("lnoscan", 664, I32, 4, "LNOSCAN", "Number of scans (early WinX)"),
    field("lavgexp", 668, I32, 4, "LAVGEXP", "Number of accumulations"),
    field("ReadoutTime", READOUT_TIME, F32, 4, "READTIME", "Experiment readout time in ms"),
    field("TriggeredModeFlag", 676, I16, 2, "TRIGMODE", "T/F triggered timing option"),
    field("sw_version", 688, Ascii, 16, "SWVERS", "Version of SW creating this file"),
    field("type", 704, I16, 2, "SWTYPE", "Type of SW creating this file"),
    field("flatFieldApplied", 706, I16, 2, "FLATAPPL", "1 if flat field was applied"),
    field("kin_trig_mode", 724, I16, 2, "KINTRIG", "Kinetics trigger mode"),
    field("dlabel", 726, Ascii, 16, "DLABEL", "Data label"),
    field("PulseFileName", 1178, Ascii, 120, "PULSFILE", "Name of pulser file"),
    field("AbsorbFileName", 1298, Ascii, 120, "ABSFILE", "Name of absorbance file"),
    field("NumExpRepeats", 1418, U32, 4, "EXPREPS", "Number of times experiment repeated"),
    field("NumExpAccums", 1422, U32, 4, "EXPACCS", "Number of time experiment accumulated"),
    field("YT_Flag", 1426, I16, 2, "YTFLAG", "Set to 1 if this file contains YT data"),
    field("clkspd_us", 1428, F32, 4, "CLKSPDUS", "Vert clock speed in micro-sec"),
    field("HWaccumFlag", 1432, I16, 2, "HWACCUM", "Set to 1 if accum done by hardware"),
    field("StoreSync", 1434, I16, 2, "STORSYNC", "Set to 1 if store sync used"),
    field("BlemishApplied", 1436, I16, 2, "BLEMAPPL", "Set to 1 if blemish removal applied"),
    field("CosmicApplied", 1438, I16, 2, "COSMAPPL", "Set to 1 if cosmic ray removal applied"),
    field("CosmicType", 1440, I16, 2, "COSMTYPE", "If cosmic ray applied, this is type"),
    field("CosmicThreshold", 1442, F32, 4, "COSMTHR", "Threshold of cosmic ray removal"),
    field("NumFrames", NUM_FRAMES, I32, 4, "NUMFRAME", "Number of frames in file"),
    field("MaxIntensity", 1450, F32, 4, "MAXINTEN", "Max intensity of data (future)"),
    field("MinIntensity", 1454, F32, 4, "MININTEN", "Min intensity of data (future)"),
    field("ylabel", 1458, Ascii, 16, "YLABEL", "Y axis label"),
    field("ShutterType", 1474, U16, 2, "SHUTTYPE", "Shutter type"),
    field("shutterComp", 1476, F32, 4, "SHUTCOMP", "Shutter compensation time"),
    field("readoutMode", 1480, U16, 2, "READMODE", "Readout mode, full, kinetics, etc"),
    field("WindowSize", 1482, U16, 2, "WINSIZE", "Window size for kinetics only"),
    field("clkspd", 1484, U16, 2, "CLKSPD", "Clock speed for kinetics and frame transfer"),
    field("interface_type", 1486, U16, 2, "INTERFAC", "Computer interface type"),
    field("NumROIsInExperiment", 1488, I16, 2, "NROIEXP", "May be more than the 10 allowed in this header"),
    field("controllerNum", 1506, U16, 2, "CTRLNUM", "If multiple controller system"),
    field("SWmade", 1508, U16, 2, "SWMADE", "Which software package created this file"),
    field("NumROI", 1510, I16, 2, "NUMROI", "Number of ROIs used, if 0 assume 1"),
    field("FlatField", 1632, Ascii, 120, "FLATFILE", "Flat field file name"),
    field("background", 1752, Ascii, 120, "BKGFILE", "Background sub. file name"),
    field("blemish", 1872, Ascii, 120, "BLEMFILE", "Blemish file name"),
    field("file_header_ver", FILE_HEADER_VER, F32, 4, "HDRVER", "Version of this file header"),
    field("WinView_id", 2996, I32, 4, "WINVIEW", "0x01234567 if file created by WinX"),
    field("Istring", 3978, Ascii, 40, "ISTRING", "Special intensity scaling string"),
    field("SpecType", 4043, U8, 1, "SPECTYPE", "Spectrometer type"),
    field("SpecModel", 4044, U8, 1, "SPECMODL", "Spectrometer model type"),
    field("PulseBurstUsed", 4045, U8, 1, "PBURSTUS", "Pulser burst mode on/off"),
    field("PulseBurstCount", 4046, U32, 4, "PBURSTCT", "Pulser triggers per burst"),
    field("PulseBurstPeriod", 4050, F64, 8, "PBURSTPE", "Pulser burst period (in usec)"),
    field("PulseBracketUsed", 4058, U8, 1, "PBRACKUS", "Pulser bracket pulsing on/off"),
    field("PulseBracketType", 4059, U8, 1, "PBRACKTY", "Pulser bracket pulsing type"),
    field("PulseTimeConstFast", 4060, F64, 8, "PTCFAST", "Pulser slow exponential time constant (in usec)"),
    field("PulseAmplitudeFast", 4068, F64, 8, "PAMPFAST", "Pulser fast exponential amplitude constant"),
    field("PulseTimeConstSlow", 4076, F64, 8, "PTCSLOW", "Pulser slow exponential time constant (in usec)"),
    field("PulseAmplitudeSlow", 4084, F64, 8, "PAMPSLOW", "Pulser slow exponential amplitude constant"),
    field("AnalogGain", 4092, I16, 2, "ANLGGAIN", "Analog gain"),
    field("AvGainUsed", 4094, I16, 2, "AVGAINUS", "Avalanche gain was used"),
    field("AvGain", 4096, I16, 2, "AVGAIN", "Avalanche gain value"),
    field("lastvalue", LAST_VALUE, I16, 2, "LASTVAL", "Always 0x5555"),
];

/// Entry of [`LEGACY_FIELDS`] named `name`.
pub fn legacy_field(name: &str) -> Option<&'static HeaderField> {
    LEGACY_FIELDS.iter().find(|f| f.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn fields_fit_the_header_in_order() {
        for pair in LEGACY_FIELDS.windows(2) {
            assert!(
                pair[0].offset + pair[0].length <= pair[1].offset,
                "{} overlaps {}",
                pair[0].name,
                pair[1].name
            );
        }
        for f in LEGACY_FIELDS {
            assert!(f.offset + f.length <= HEADER_SIZE, "{} ends past the header", f.name);
            if let Some(width) = f.field_type.width() {
                assert_eq!(width, f.length, "{} width", f.name);
            }
        }
    }

    #[test]
    fn keywords_are_unique_fits_names() {
        let mut seen = HashSet::new();
        for f in LEGACY_FIELDS {
            assert!(f.keyword.len() <= 8, "{} is too long", f.keyword);
            assert!(
                f.keyword
                    .bytes()
                    .all(|b| matches!(b, b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_')),
                "{} has invalid characters",
                f.keyword
            );
            assert!(seen.insert(f.keyword), "{} used twice", f.keyword);
        }
    }

    #[test]
    fn named_offsets_agree_with_table() {
        assert_eq!(legacy_field("ReadoutTime").map(|f| f.offset), Some(READOUT_TIME));
        assert_eq!(legacy_field("NumFrames").map(|f| f.offset), Some(NUM_FRAMES));
        assert_eq!(legacy_field("lastvalue").map(|f| f.offset), Some(LAST_VALUE));
        assert!(legacy_field("Spare_4").is_none());
    }
}
