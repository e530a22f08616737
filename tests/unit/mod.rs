mod test_config_parser;
mod test_csv_serializer;
mod test_row_validator;
