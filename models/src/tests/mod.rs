mod display_builder;
