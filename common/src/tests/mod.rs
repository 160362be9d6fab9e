mod redacted_value;
